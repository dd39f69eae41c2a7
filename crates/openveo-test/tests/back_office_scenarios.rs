//! Back office scenarios: authentication, menus, languages, alerts and
//! failure screenshots against the fake back office.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use openveo_test::mock::back_office::{self, ENTITIES_PATH};
use openveo_test::mock::{EntityForms, FakeBackOffice, MockApp, MockBrowser};
use openveo_test::pages::LANGUAGES;
use openveo_test::prelude::*;
use openveo_test::screenshot::ScreenshotReporter;
use serde_json::json;
use std::sync::Arc;

const BASE_URL: &str = "http://localhost:3000/";

fn admin() -> User {
    User::new("admin", "admin@example.com", "secret")
}

fn browser(store: &MemoryStore) -> Arc<MockBrowser<FakeBackOffice>> {
    Arc::new(MockBrowser::new(
        BASE_URL,
        FakeBackOffice::new(store.clone()).with_user(admin()),
    ))
}

fn config() -> TestConfig {
    TestConfig::new(BASE_URL).with_super_admin(admin())
}

// ============================================================================
// Authentication and navigation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_login_navigate_and_logout() {
    let store = MemoryStore::new();
    let browser = browser(&store);
    let session = Session::new(browser.clone(), config());
    let mut home = BackEndPage::new(session, "be/", Arc::new(back_office::translations()));

    home.log_as_admin().await.unwrap();
    home.load().await.unwrap();
    assert!(home.back_end().is_logged().await.unwrap());

    home.back_end().click_menu("Entities").await.unwrap();
    assert_eq!(browser.with_app(|app| app.path()).unwrap(), ENTITIES_PATH);

    match home.back_end().click_menu("Playlists").await.unwrap_err() {
        VeoError::MenuItemNotFound { name } => assert_eq!(name, "Playlists"),
        other => panic!("unexpected error {other}"),
    }

    home.logout().await.unwrap();
    assert!(!browser.with_app(|app| app.is_logged()).unwrap());
    assert!(home.back_end().user().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_pages_share_one_command_queue() {
    let store = MemoryStore::new();
    let session = Session::new(browser(&store), config());
    let helper = Helper::new(Arc::new(store.clone()), session.clone());
    let mut page = TablePage::new(
        session.clone(),
        ENTITIES_PATH,
        Arc::new(back_office::translations()),
        EntityForms,
    );
    page.log_as_admin().await.unwrap();
    page.load().await.unwrap();

    let before = session.flow().executed();
    helper.add_entities_auto("video", 2, 0).await.unwrap();
    page.refresh().await.unwrap();
    assert_eq!(page.table().get_total_lines().await.unwrap(), 2);
    assert!(session.flow().executed() > before);
    assert!(session.flow().same_queue(page.table().session().flow()));
}

// ============================================================================
// Languages and alerts
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_remove_in_french_after_language_switch() {
    let store = MemoryStore::new();
    let browser = browser(&store);
    let session = Session::new(browser.clone(), config());
    let mut page = TablePage::new(
        session,
        ENTITIES_PATH,
        Arc::new(back_office::translations()),
        EntityForms,
    );
    page.log_as_admin().await.unwrap();
    page.load().await.unwrap();
    page.add_line("Intro", &json!({})).await.unwrap();
    page.add_line("Outro", &json!({})).await.unwrap();
    page.back_end().close_alerts().await.unwrap();

    page.select_language(LANGUAGES[1]).await.unwrap();
    assert_eq!(browser.with_app(|app| app.language().to_string()).unwrap(), "fr");
    page.remove_line("Intro").await.unwrap();

    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(
        page.back_end().get_alert_messages().await.unwrap(),
        vec!["1 element(s) removed".to_string()]
    );
    page.back_end().close_alerts().await.unwrap();
    assert!(page.back_end().get_alert_messages().await.unwrap().is_empty());
}

// ============================================================================
// Failure screenshots
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_scenario_leaves_a_screenshot() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    let config = config().with_screenshots(dir.path());
    let reporter = ScreenshotReporter::from_config(&config, "Chrome")
        .unwrap()
        .with_run_id("run");
    let session = Session::new(browser(&store), config);
    let mut home = BackEndPage::new(session.clone(), "be/", Arc::new(back_office::translations()));
    home.log_as_admin().await.unwrap();

    let passed = home.back_end().click_menu("Playlists").await.is_ok();
    let path = reporter
        .post_test(&session, passed, "Menu", "should open playlists")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(path, dir.path().join("run/chrome/menu/should-open-playlists.png"));
    assert!(path.exists());
}
