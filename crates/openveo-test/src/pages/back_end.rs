//! Back office capability: authentication, left menu, alerts and languages.

use super::page::Page;
use crate::config::User;
use crate::i18n::{TranslationSource, Translations};
use crate::locator::{Finder, Locator};
use crate::result::{VeoError, VeoResult};
use crate::session::Session;
use crate::wait::Expectation;
use futures::future::BoxFuture;
use std::sync::Arc;
use tracing::{debug, info};

/// Interface language of the back office
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// Language code (`en`), also the class of its option in the language menu
    pub code: &'static str,
    /// Key of the language name in the dictionaries
    pub translation_code: &'static str,
}

/// Languages of the back office, default first
pub const LANGUAGES: [Language; 2] = [
    Language {
        code: "en",
        translation_code: "ENGLISH",
    },
    Language {
        code: "fr",
        translation_code: "FRENCH",
    },
];

const LOGIN_PATH: &str = "be/login";

/// Authentication, menu and language operations of any back office page
#[derive(Clone)]
pub struct BackEnd {
    session: Session,
    source: Arc<dyn TranslationSource>,
    translations: Translations,
    language: Language,
    user: Option<User>,
}

impl std::fmt::Debug for BackEnd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackEnd")
            .field("language", &self.language.code)
            .field("user", &self.user.as_ref().map(|u| u.email.as_str()))
            .finish_non_exhaustive()
    }
}

impl BackEnd {
    #[must_use]
    pub fn new(session: Session, source: Arc<dyn TranslationSource>) -> Self {
        Self {
            session,
            source,
            translations: Translations::empty(),
            language: LANGUAGES[0],
            user: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn languages(&self) -> &'static [Language] {
        &LANGUAGES
    }

    /// Language selected last
    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Dictionaries of the selected language
    #[must_use]
    pub fn translations(&self) -> &Translations {
        &self.translations
    }

    /// Translation of a dotted key, the key itself when missing
    #[must_use]
    pub fn translate(&self, key: &str) -> String {
        self.translations.translate(key)
    }

    /// Account logged in through [`BackEnd::log_as`]
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    fn left_menu() -> Finder {
        Finder::all(Locator::id("sidebar-wrapper"))
    }

    fn toggle_left_menu_link() -> Finder {
        Finder::css(".navbar-header button")
    }

    fn level1_items() -> Finder {
        Finder::css("#sidebar-wrapper > ul > li")
    }

    fn logout_link() -> Finder {
        Finder::css(".nav a[href=\"logout\"]")
    }

    fn login_fields() -> Expectation {
        Expectation::All(vec![
            Expectation::Visible(Finder::all(Locator::model("userEmail"))),
            Expectation::Visible(Finder::all(Locator::model("password"))),
            Expectation::Visible(Finder::all(Locator::binding("LOGIN.SUBMIT"))),
        ])
    }

    /// Option of `code` in the language menu
    #[must_use]
    pub fn language_option(code: &str) -> Finder {
        Finder::css(format!(".nav .language li > .{code}"))
    }

    // ------------------------------------------------------------------
    // Languages
    // ------------------------------------------------------------------

    /// Switch the interface language, reload `page` and fetch its dictionaries
    pub async fn select_language(&mut self, page: &Page, language: Language) -> VeoResult<()> {
        info!(language = language.code, "select language");
        self.language = language;
        self.session.click(&Finder::css(".nav .language > a")).await?;
        self.session
            .click_with_delay(
                &Self::language_option(language.code),
                Some(self.session.short_wait()),
            )
            .await?;
        page.load().await?;
        self.session.wait_for_angular().await?;
        self.translations = self.source.back_end_translations(language.code).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------

    /// Log out then log in as `user`
    pub async fn log_as(&mut self, user: &User) -> VeoResult<()> {
        info!(email = %user.email, "log in");
        self.logout().await?;
        let session = &self.session;
        session
            .wait(Self::login_fields(), session.long_wait(), "Missing one or several login fields")
            .await?;
        session
            .send_keys(&Finder::all(Locator::model("userEmail")), &user.email)
            .await?;
        session
            .send_keys(&Finder::all(Locator::model("password")), &user.password)
            .await?;
        session.click(&Finder::all(Locator::binding("LOGIN.SUBMIT"))).await?;
        self.user = Some(user.clone());
        session
            .wait(
                Expectation::Visible(Self::toggle_left_menu_link()),
                session.long_wait(),
                "Missing left menu toggle button",
            )
            .await
    }

    /// Log in as the configured super administrator
    pub async fn log_as_admin(&mut self) -> VeoResult<()> {
        let user = self
            .session
            .config()
            .users
            .super_admin
            .clone()
            .ok_or_else(|| VeoError::Config {
                message: "no super administrator account configured".to_string(),
            })?;
        self.log_as(&user).await
    }

    /// Log out, doing nothing when the login page is already shown
    pub async fn logout(&mut self) -> VeoResult<()> {
        let session = &self.session;
        session.get(LOGIN_PATH).await?;
        let current = session.current_url().await?;
        if current == session.config().url(LOGIN_PATH) {
            self.user = None;
            return Ok(());
        }

        debug!("log out");
        session.click(&Self::logout_link()).await?;
        self.user = None;
        session
            .wait(Self::login_fields(), session.long_wait(), "Missing one or several login fields")
            .await
    }

    /// Whether the page shows the logout link
    pub async fn is_logged(&self) -> VeoResult<bool> {
        self.session.is_present(&Self::logout_link()).await
    }

    pub async fn click_profile(&self) -> VeoResult<()> {
        self.session.click(&Finder::css(".nav a[href=\"profile\"]")).await
    }

    // ------------------------------------------------------------------
    // Left menu
    // ------------------------------------------------------------------

    pub async fn is_menu_opened(&self) -> VeoResult<bool> {
        self.session.is_visible(&Self::left_menu()).await
    }

    pub async fn open_menu(&self) -> VeoResult<()> {
        if self.is_menu_opened().await? {
            return Ok(());
        }
        self.session.click(&Self::toggle_left_menu_link()).await?;
        self.session
            .wait(
                Expectation::Visible(Self::left_menu()),
                self.session.short_wait(),
                "Missing left menu",
            )
            .await
    }

    pub async fn close_menu(&self) -> VeoResult<()> {
        if !self.is_menu_opened().await? {
            return Ok(());
        }
        self.session.click(&Self::toggle_left_menu_link()).await?;
        self.session
            .wait(
                Expectation::Invisible(Self::left_menu()),
                self.session.short_wait(),
                "Menu still visible",
            )
            .await
    }

    /// Level 1 items, all of them or only those labelled `name`
    pub async fn get_level1_menu_items(&self, name: Option<&str>) -> VeoResult<Vec<Finder>> {
        self.open_menu().await?;
        self.filter_items(&Self::level1_items(), name).await
    }

    /// Level 2 items under the level 1 item `level1`, opening its sub menu
    pub async fn get_level2_menu_items(
        &self,
        level1: &str,
        name: Option<&str>,
    ) -> VeoResult<Vec<Finder>> {
        let item = self.level1_item(level1).await?;
        self.open_sub_menu(level1).await?;
        self.filter_items(&item.find_css(".sub-menu > li"), name).await
    }

    async fn filter_items(&self, items: &Finder, name: Option<&str>) -> VeoResult<Vec<Finder>> {
        let mut matching = Vec::new();
        for i in 0..self.session.count(items).await? {
            let item = items.nth(i as isize);
            let text = self.session.text(&item.find(Locator::xpath("./a"))).await?;
            if name.map_or(true, |name| name == text) {
                matching.push(item);
            }
        }
        Ok(matching)
    }

    async fn level1_item(&self, name: &str) -> VeoResult<Finder> {
        self.get_level1_menu_items(Some(name))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VeoError::MenuItemNotFound {
                name: name.to_string(),
            })
    }

    pub async fn is_sub_menu_opened(&self, name: &str) -> VeoResult<bool> {
        let item = self.level1_item(name).await?;
        self.session.is_visible(&item.find_css(".sub-menu")).await
    }

    pub async fn open_sub_menu(&self, name: &str) -> VeoResult<()> {
        let item = self.level1_item(name).await?;
        let sub_menu = item.find_css(".sub-menu");
        if self.session.is_visible(&sub_menu).await? {
            return Ok(());
        }
        self.session.click(&item.find(Locator::xpath("./a"))).await?;
        self.session
            .wait(Expectation::Visible(sub_menu), self.session.short_wait(), "Missing sub menu")
            .await
    }

    pub async fn close_sub_menu(&self, name: &str) -> VeoResult<()> {
        if !self.is_menu_opened().await? {
            return Ok(());
        }
        let item = self.level1_item(name).await?;
        let sub_menu = item.find_css(".sub-menu");
        if !self.session.is_visible(&sub_menu).await? {
            return Ok(());
        }
        self.session.click(&item.find(Locator::xpath("./a"))).await?;
        self.session
            .wait(
                Expectation::Invisible(sub_menu),
                self.session.short_wait(),
                "Sub menu still visible",
            )
            .await
    }

    /// Click the menu item labelled `name`, at any depth of the menu
    pub async fn click_menu(&self, name: &str) -> VeoResult<()> {
        info!(item = name, "click menu");
        self.open_menu().await?;
        if self.click_menu_in(Self::level1_items(), name).await? {
            Ok(())
        } else {
            Err(VeoError::MenuItemNotFound {
                name: name.to_string(),
            })
        }
    }

    /// Depth first walk of `items`, opening sub menus on the way
    fn click_menu_in<'a>(&'a self, items: Finder, name: &'a str) -> BoxFuture<'a, VeoResult<bool>> {
        Box::pin(async move {
            let session = &self.session;
            for i in 0..session.count(&items).await? {
                let item = items.nth(i as isize);
                let link = item.find(Locator::xpath("./a"));
                if session.text(&link).await? == name {
                    session.click(&link).await?;
                    return Ok(true);
                }

                let sub_menu = item.find_css(".sub-menu");
                if !session.is_present(&sub_menu).await? {
                    continue;
                }
                if !session.is_visible(&sub_menu).await? {
                    session.click(&link).await?;
                    session
                        .wait(
                            Expectation::Visible(sub_menu),
                            session.long_wait(),
                            "Missing sub menu",
                        )
                        .await?;
                }
                if self.click_menu_in(item.find_css(".sub-menu > li"), name).await? {
                    return Ok(true);
                }
            }
            Ok(false)
        })
    }

    // ------------------------------------------------------------------
    // Alerts
    // ------------------------------------------------------------------

    /// Messages of the displayed alerts
    pub async fn get_alert_messages(&self) -> VeoResult<Vec<String>> {
        self.session.wait_for_angular().await?;
        let alerts = Finder::css(".alert");
        let mut messages = Vec::new();
        for i in 0..self.session.count(&alerts).await? {
            let message = alerts.nth(i as isize).find(Locator::binding("alert.msg"));
            messages.push(self.session.text(&message).await?);
        }
        Ok(messages)
    }

    /// Close every alert
    pub async fn close_alerts(&self) -> VeoResult<()> {
        self.session.wait_for_angular().await?;
        let close = Finder::css(".alert").first().find_css("button");
        for _ in 0..self.session.count(&Finder::css(".alert")).await? {
            self.session.click(&close).await?;
        }
        Ok(())
    }
}

/// Any page of the back office
#[derive(Debug, Clone)]
pub struct BackEndPage {
    page: Page,
    back_end: BackEnd,
}

impl BackEndPage {
    #[must_use]
    pub fn new(
        session: Session,
        path: impl Into<String>,
        source: Arc<dyn TranslationSource>,
    ) -> Self {
        Self {
            page: Page::new(session.clone(), path),
            back_end: BackEnd::new(session, source),
        }
    }

    #[must_use]
    pub fn with_ready(mut self, ready: Finder) -> Self {
        self.page = self.page.with_ready(ready);
        self
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    #[must_use]
    pub fn back_end(&self) -> &BackEnd {
        &self.back_end
    }

    pub fn back_end_mut(&mut self) -> &mut BackEnd {
        &mut self.back_end
    }

    /// Load the page in the default language
    pub async fn load(&mut self) -> VeoResult<()> {
        self.page.load().await?;
        self.back_end.select_language(&self.page, LANGUAGES[0]).await
    }

    pub async fn select_language(&mut self, language: Language) -> VeoResult<()> {
        self.back_end.select_language(&self.page, language).await
    }

    pub async fn refresh(&self) -> VeoResult<()> {
        self.page.refresh().await
    }

    pub async fn log_as(&mut self, user: &User) -> VeoResult<()> {
        self.back_end.log_as(user).await
    }

    pub async fn log_as_admin(&mut self) -> VeoResult<()> {
        self.back_end.log_as_admin().await
    }

    pub async fn logout(&mut self) -> VeoResult<()> {
        self.back_end.logout().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::TestConfig;
    use crate::helper::MemoryStore;
    use crate::mock::{back_office, FakeBackOffice, MockApp, MockBrowser};

    const BASE_URL: &str = "http://localhost/";

    fn admin() -> User {
        User::new("admin", "admin@example.com", "secret")
    }

    fn back_office_page(path: &str) -> (BackEndPage, Arc<MockBrowser<FakeBackOffice>>) {
        let app = FakeBackOffice::new(MemoryStore::new()).with_user(admin());
        let browser = Arc::new(MockBrowser::new(BASE_URL, app));
        let config = TestConfig::new(BASE_URL).with_super_admin(admin());
        let session = Session::new(browser.clone(), config);
        let page = BackEndPage::new(session, path, Arc::new(back_office::translations()));
        (page, browser)
    }

    async fn logged_page(path: &str) -> (BackEndPage, Arc<MockBrowser<FakeBackOffice>>) {
        let (mut page, browser) = back_office_page(path);
        page.log_as_admin().await.unwrap();
        page.load().await.unwrap();
        (page, browser)
    }

    mod authentication_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_log_as_admin() {
            let (mut page, browser) = back_office_page("be/");
            page.log_as_admin().await.unwrap();
            assert!(browser.with_app(|app| app.is_logged()).unwrap());
            assert!(page.back_end().is_logged().await.unwrap());
            assert_eq!(page.back_end().user().unwrap().email, "admin@example.com");
        }

        #[tokio::test(start_paused = true)]
        async fn test_logout() {
            let (mut page, browser) = logged_page("be/").await;
            page.logout().await.unwrap();
            assert!(!browser.with_app(|app| app.is_logged()).unwrap());
            assert!(page.back_end().user().is_none());
            // Already on the login page
            page.logout().await.unwrap();
        }

        #[tokio::test(start_paused = true)]
        async fn test_wrong_password_times_out() {
            let (mut page, _) = back_office_page("be/");
            let intruder = User::new("admin", "admin@example.com", "guess");
            let err = page.log_as(&intruder).await.unwrap_err();
            assert!(matches!(err, VeoError::Timeout { ms: 5000, .. }));
        }

        #[tokio::test]
        async fn test_missing_super_admin() {
            let app = FakeBackOffice::new(MemoryStore::new());
            let browser = Arc::new(MockBrowser::new(BASE_URL, app));
            let session = Session::new(browser, TestConfig::new(BASE_URL));
            let mut back_end = BackEnd::new(session, Arc::new(back_office::translations()));
            assert!(matches!(back_end.log_as_admin().await, Err(VeoError::Config { .. })));
        }

        #[tokio::test(start_paused = true)]
        async fn test_load_requires_login() {
            let (mut page, _) = back_office_page("be/");
            assert!(matches!(page.load().await, Err(VeoError::PageLoad { .. })));
        }
    }

    mod language_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_select_language_loads_dictionaries() {
            let (mut page, browser) = logged_page("be/").await;
            assert_eq!(page.back_end().translate(crate::pages::REMOVE_ACTION_KEY), "Remove");

            page.select_language(LANGUAGES[1]).await.unwrap();
            assert_eq!(page.back_end().language().code, "fr");
            assert_eq!(page.back_end().translate(crate::pages::REMOVE_ACTION_KEY), "Supprimer");
            assert_eq!(browser.with_app(|app| app.language().to_string()).unwrap(), "fr");
        }
    }

    mod menu_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_open_and_close_menu() {
            let (page, _) = logged_page("be/").await;
            let back_end = page.back_end();
            assert!(!back_end.is_menu_opened().await.unwrap());
            back_end.open_menu().await.unwrap();
            assert!(back_end.is_menu_opened().await.unwrap());
            back_end.close_menu().await.unwrap();
            assert!(!back_end.is_menu_opened().await.unwrap());
        }

        #[tokio::test(start_paused = true)]
        async fn test_menu_items() {
            let (page, _) = logged_page("be/").await;
            let back_end = page.back_end();
            assert_eq!(back_end.get_level1_menu_items(None).await.unwrap().len(), 3);
            assert_eq!(back_end.get_level1_menu_items(Some("Rights")).await.unwrap().len(), 1);
            assert_eq!(back_end.get_level2_menu_items("Content", None).await.unwrap().len(), 2);
            assert!(back_end.is_sub_menu_opened("Content").await.unwrap());
            back_end.close_sub_menu("Content").await.unwrap();
            assert!(!back_end.is_sub_menu_opened("Content").await.unwrap());
            assert!(matches!(
                back_end.get_level2_menu_items("Settings", None).await,
                Err(VeoError::MenuItemNotFound { .. })
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_menu_walks_sub_menus() {
            let (page, browser) = logged_page("be/").await;
            page.back_end().click_menu("Roles").await.unwrap();
            assert_eq!(browser.with_app(|app| app.path()).unwrap(), "be/roles");
            page.back_end().click_menu("Dashboard").await.unwrap();
            assert_eq!(browser.with_app(|app| app.path()).unwrap(), "be/");
        }

        #[tokio::test(start_paused = true)]
        async fn test_click_missing_menu_item() {
            let (page, _) = logged_page("be/").await;
            match page.back_end().click_menu("Settings").await.unwrap_err() {
                VeoError::MenuItemNotFound { name } => assert_eq!(name, "Settings"),
                other => panic!("unexpected error {other}"),
            }
        }
    }

    mod alert_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_read_and_close_alerts() {
            let (page, browser) = logged_page("be/").await;
            browser
                .with_app(|app| {
                    app.push_alert("Saved");
                    app.push_alert("Published");
                })
                .unwrap();
            let back_end = page.back_end();
            assert_eq!(back_end.get_alert_messages().await.unwrap(), ["Saved", "Published"]);
            back_end.close_alerts().await.unwrap();
            assert!(back_end.get_alert_messages().await.unwrap().is_empty());
        }
    }
}
