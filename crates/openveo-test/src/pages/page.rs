//! Navigation capability shared by every page.

use crate::driver::ScriptArg;
use crate::locator::Finder;
use crate::result::{VeoError, VeoResult};
use crate::scripts;
use crate::session::Session;
use crate::wait::Expectation;
use serde_json::Value;
use tracing::{debug, info};

/// A page reachable at a path relative to the base URL
#[derive(Debug, Clone)]
pub struct Page {
    session: Session,
    path: String,
    ready: Option<Finder>,
}

impl Page {
    #[must_use]
    pub fn new(session: Session, path: impl Into<String>) -> Self {
        Self {
            session,
            path: path.into(),
            ready: None,
        }
    }

    /// Element that must be visible before the page is considered loaded
    #[must_use]
    pub fn with_ready(mut self, ready: Finder) -> Self {
        self.ready = Some(ready);
        self
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Path relative to the base URL
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Absolute URL of the page
    #[must_use]
    pub fn url(&self) -> String {
        self.session.config().url(&self.path)
    }

    /// Navigate to the page and check the browser landed on it
    pub async fn load(&self) -> VeoResult<()> {
        info!(path = %self.path, "load page");
        self.session.get(&self.path).await?;
        self.disable_animations().await?;

        let expected = self.url();
        let actual = self.session.current_url().await?;
        if actual.trim_end_matches('/') != expected.trim_end_matches('/') {
            return Err(VeoError::PageLoad { expected, actual });
        }
        self.on_loaded().await
    }

    /// Reload the current page
    pub async fn refresh(&self) -> VeoResult<()> {
        self.session.refresh().await?;
        self.disable_animations().await?;
        self.on_loaded().await
    }

    async fn disable_animations(&self) -> VeoResult<()> {
        self.session
            .execute_script(scripts::DISABLE_ANIMATIONS, Vec::new())
            .await
            .map(|_| ())
    }

    async fn on_loaded(&self) -> VeoResult<()> {
        match &self.ready {
            Some(ready) => {
                self.session
                    .wait(
                        Expectation::Visible(ready.clone()),
                        self.session.long_wait(),
                        "Page not ready",
                    )
                    .await
            }
            None => Ok(()),
        }
    }

    pub async fn title(&self) -> VeoResult<String> {
        self.session.title().await
    }

    pub async fn delete_cookies(&self) -> VeoResult<()> {
        self.session.delete_all_cookies().await
    }

    /// Send an HTTP request from the page, sharing its cookies.
    ///
    /// Returns `{ status, body }` as reported by the browser.
    pub async fn send_request(
        &self,
        path: &str,
        method: &str,
        data: Option<Value>,
    ) -> VeoResult<Value> {
        let url = self.session.config().url(path);
        debug!(url = %url, method, "send request");
        self.session
            .execute_script(
                scripts::SEND_REQUEST,
                vec![
                    ScriptArg::Value(method.into()),
                    ScriptArg::Value(url.into()),
                    ScriptArg::Value(data.unwrap_or(Value::Null)),
                ],
            )
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::TestConfig;
    use crate::mock::{El, MockApp, MockBrowser, MockEvent, Reaction, StaticApp};
    use serde_json::json;
    use std::sync::Arc;

    /// Sends every path but `be/` to the login page
    #[derive(Debug, Default)]
    struct RedirectApp {
        path: String,
    }

    impl MockApp for RedirectApp {
        fn render(&self) -> El {
            El::new("body").child(El::new("div").class("ready").text(self.path.clone()))
        }

        fn path(&self) -> String {
            self.path.clone()
        }

        fn navigate(&mut self, path: &str) {
            self.path = if path == "be/" { path.to_string() } else { "be/login".to_string() };
        }

        fn title(&self) -> String {
            "OpenVeo".to_string()
        }

        fn handle(&mut self, event: &MockEvent) -> Reaction {
            match event {
                MockEvent::Script { script, args } if script == scripts::SEND_REQUEST => {
                    Reaction::value(json!({ "status": 200, "body": args[1].as_str() }))
                }
                _ => Reaction::ignored(),
            }
        }
    }

    fn page(path: &str) -> (Page, Arc<MockBrowser<RedirectApp>>) {
        let browser = Arc::new(MockBrowser::new("http://localhost/", RedirectApp::default()));
        let session = Session::new(browser.clone(), TestConfig::new("http://localhost/"));
        (Page::new(session, path), browser)
    }

    mod load_tests {
        use super::*;

        #[tokio::test]
        async fn test_load_checks_url() {
            let (page, browser) = page("be/");
            page.load().await.unwrap();
            assert!(browser.was_called("get:http://localhost/be/"));
            assert_eq!(page.title().await.unwrap(), "OpenVeo");
        }

        #[tokio::test]
        async fn test_redirect_fails_load() {
            let (page, _) = page("be/videos");
            match page.load().await.unwrap_err() {
                VeoError::PageLoad { expected, actual } => {
                    assert_eq!(expected, "http://localhost/be/videos");
                    assert_eq!(actual, "http://localhost/be/login");
                }
                other => panic!("unexpected error {other}"),
            }
        }

        #[tokio::test(start_paused = true)]
        async fn test_ready_element_awaited() {
            let browser = Arc::new(MockBrowser::new(
                "http://localhost/",
                StaticApp::new("be/", El::new("body")),
            ));
            let session = Session::new(browser, TestConfig::new("http://localhost/"));
            let page = Page::new(session, "be/").with_ready(Finder::css(".ready"));
            let err = page.load().await.unwrap_err();
            assert!(matches!(err, VeoError::Timeout { ms: 5000, .. }));
        }
    }

    mod request_tests {
        use super::*;

        #[tokio::test]
        async fn test_send_request_uses_absolute_url() {
            let (page, _) = page("be/");
            let response = page.send_request("be/videos", "GET", None).await.unwrap();
            assert_eq!(response["status"], 200);
            assert_eq!(response["body"], "http://localhost/be/videos");
        }
    }
}
