//! Browser session shared by pages, fields and helpers.
//!
//! A [`Session`] owns the driver, the task queue and the run configuration.
//! Every driver call goes through the [`ControlFlow`]; element level helpers
//! take a [`Finder`] and resolve it right before acting.

use crate::config::TestConfig;
use crate::driver::{ElementId, ScriptArg, Screenshot, WebDriver};
use crate::flow::ControlFlow;
use crate::locator::{pick_index, Finder, Locator, Step};
use crate::result::{VeoError, VeoResult};
use crate::scripts;
use crate::wait::{poll_until, Expectation};
use futures::future::BoxFuture;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Browser session for one test run
#[derive(Clone)]
pub struct Session {
    driver: Arc<dyn WebDriver>,
    flow: ControlFlow,
    config: Arc<TestConfig>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.config.base_url)
            .field("flow", &self.flow)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Session over `driver` with its own task queue
    #[must_use]
    pub fn new(driver: Arc<dyn WebDriver>, config: TestConfig) -> Self {
        Self {
            driver,
            flow: ControlFlow::new(),
            config: Arc::new(config),
        }
    }

    /// Share an existing task queue
    #[must_use]
    pub fn with_flow(mut self, flow: ControlFlow) -> Self {
        self.flow = flow;
        self
    }

    /// Run configuration
    #[must_use]
    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Task queue of the session
    #[must_use]
    pub fn flow(&self) -> &ControlFlow {
        &self.flow
    }

    /// Underlying driver
    #[must_use]
    pub fn driver(&self) -> &Arc<dyn WebDriver> {
        &self.driver
    }

    /// Short wait budget (ms)
    #[must_use]
    pub fn short_wait(&self) -> u64 {
        self.config.timeouts.short_ms
    }

    /// Long wait budget (ms)
    #[must_use]
    pub fn long_wait(&self) -> u64 {
        self.config.timeouts.long_ms
    }

    // ------------------------------------------------------------------
    // Browser level
    // ------------------------------------------------------------------

    /// Navigate to an application path or an absolute URL
    pub async fn get(&self, path: &str) -> VeoResult<()> {
        let url = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            self.config.url(path)
        };
        debug!(url = %url, "navigate");
        self.flow.execute(self.driver.get(&url)).await
    }

    /// Current URL
    pub async fn current_url(&self) -> VeoResult<String> {
        self.flow.execute(self.driver.current_url()).await
    }

    /// Document title
    pub async fn title(&self) -> VeoResult<String> {
        self.flow.execute(self.driver.title()).await
    }

    /// Reload the page
    pub async fn refresh(&self) -> VeoResult<()> {
        self.flow.execute(self.driver.refresh()).await
    }

    /// Drop every cookie
    pub async fn delete_all_cookies(&self) -> VeoResult<()> {
        self.flow.execute(self.driver.delete_all_cookies()).await
    }

    /// Resize the window
    pub async fn set_window_size(&self, width: u32, height: u32) -> VeoResult<()> {
        self.flow.execute(self.driver.set_window_size(width, height)).await
    }

    /// Take a screenshot
    pub async fn screenshot(&self) -> VeoResult<Screenshot> {
        self.flow.execute(self.driver.screenshot()).await
    }

    /// Wait until AngularJS is idle
    pub async fn wait_for_angular(&self) -> VeoResult<()> {
        self.flow.execute(self.driver.wait_for_angular()).await
    }

    /// Run a script in page context
    pub async fn execute_script(&self, script: &str, args: Vec<ScriptArg>) -> VeoResult<Value> {
        self.flow.execute(self.driver.execute_script(script, args)).await
    }

    /// Pause the test
    pub async fn sleep(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    /// Write a screenshot to `<directory>/<name>.png`
    pub async fn take_screenshot(&self, directory: &Path, name: &str) -> VeoResult<PathBuf> {
        let shot = self.screenshot().await?;
        tokio::fs::create_dir_all(directory).await?;
        let path = directory.join(format!("{name}.png"));
        tokio::fs::write(&path, &shot.data).await?;
        Ok(path)
    }

    // ------------------------------------------------------------------
    // Element resolution
    // ------------------------------------------------------------------

    /// Every element the finder designates, in document order
    pub async fn find_all(&self, finder: &Finder) -> VeoResult<Vec<ElementId>> {
        let mut current: Vec<Option<ElementId>> = vec![None];
        for step in finder.steps() {
            current = match step {
                Step::All(locator) => {
                    let mut next = Vec::new();
                    for scope in &current {
                        let found = self
                            .flow
                            .execute(self.driver.find_elements(scope.as_ref(), locator))
                            .await?;
                        next.extend(found.into_iter().map(Some));
                    }
                    next
                }
                Step::Nth(index) => match pick_index(current.len(), *index) {
                    Some(i) => vec![current.swap_remove(i)],
                    None => Vec::new(),
                },
            };
        }
        Ok(current.into_iter().flatten().collect())
    }

    /// First element the finder designates
    pub async fn find(&self, finder: &Finder) -> VeoResult<ElementId> {
        self.find_all(finder)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| VeoError::ElementNotFound {
                locator: finder.to_string(),
            })
    }

    /// Number of designated elements
    pub async fn count(&self, finder: &Finder) -> VeoResult<usize> {
        Ok(self.find_all(finder).await?.len())
    }

    /// Whether the finder designates at least one element
    pub async fn is_present(&self, finder: &Finder) -> VeoResult<bool> {
        Ok(self.count(finder).await? > 0)
    }

    /// Whether the element is displayed, failing when absent
    pub async fn is_displayed(&self, finder: &Finder) -> VeoResult<bool> {
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.is_displayed(&id)).await
    }

    /// Whether the element is present and displayed
    pub async fn is_visible(&self, finder: &Finder) -> VeoResult<bool> {
        match self.find_all(finder).await?.first() {
            Some(id) => self.flow.execute(self.driver.is_displayed(id)).await,
            None => Ok(false),
        }
    }

    /// Whether the element is present, displayed and enabled
    pub async fn is_clickable(&self, finder: &Finder) -> VeoResult<bool> {
        let Some(id) = self.find_all(finder).await?.into_iter().next() else {
            return Ok(false);
        };
        let displayed = self.flow.execute(self.driver.is_displayed(&id)).await?;
        let enabled = self.flow.execute(self.driver.is_enabled(&id)).await?;
        Ok(displayed && enabled)
    }

    /// Visible text
    pub async fn text(&self, finder: &Finder) -> VeoResult<String> {
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.text(&id)).await
    }

    /// Visible text of every designated element
    pub async fn texts(&self, finder: &Finder) -> VeoResult<Vec<String>> {
        let mut texts = Vec::new();
        for id in self.find_all(finder).await? {
            texts.push(self.flow.execute(self.driver.text(&id)).await?);
        }
        Ok(texts)
    }

    /// Attribute value
    pub async fn attribute(&self, finder: &Finder, name: &str) -> VeoResult<Option<String>> {
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.attribute(&id, name)).await
    }

    /// Whether the class attribute lists `class`
    pub async fn has_class(&self, finder: &Finder, class: &str) -> VeoResult<bool> {
        Ok(self
            .attribute(finder, "class")
            .await?
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class)))
    }

    /// Lower-case tag name
    pub async fn tag_name(&self, finder: &Finder) -> VeoResult<String> {
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.tag_name(&id)).await
    }

    // ------------------------------------------------------------------
    // Interaction
    // ------------------------------------------------------------------

    /// Click through the flaky-click sequence
    pub async fn click(&self, finder: &Finder) -> VeoResult<()> {
        self.click_with_delay(finder, None).await
    }

    /// Click, pausing `delay` ms between hover and click.
    ///
    /// Waits for Angular, scrolls the element into the page content wrapper,
    /// clicks `option` elements directly and otherwise waits for the element
    /// to be clickable and hovers it first.
    pub async fn click_with_delay(&self, finder: &Finder, delay: Option<u64>) -> VeoResult<()> {
        debug!(element = %finder, "click");
        self.wait_for_angular().await?;
        let id = self.find(finder).await?;
        let location = self.flow.execute(self.driver.location(&id)).await?;

        let wrapper = Finder::all(Locator::id("page-content-wrapper"));
        if let Some(wrapper) = self.find_all(&wrapper).await?.into_iter().next() {
            let top = (location.y - 50.0).max(0.0);
            self.execute_script(
                scripts::SCROLL_TOP,
                vec![ScriptArg::Element(wrapper), ScriptArg::Value(top.into())],
            )
            .await?;
        }

        let tag = self.flow.execute(self.driver.tag_name(&id)).await?;
        if tag == "option" {
            return self.flow.execute(self.driver.click(&id)).await;
        }

        self.wait(
            Expectation::Clickable(finder.clone()),
            self.short_wait(),
            "Element is not clickable",
        )
        .await?;
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.mouse_move(&id)).await?;
        if let Some(delay) = delay {
            self.sleep(delay).await;
        }
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.click(&id)).await
    }

    /// Move the mouse over the element
    pub async fn mouse_move(&self, finder: &Finder) -> VeoResult<()> {
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.mouse_move(&id)).await
    }

    /// Type keys into the element
    pub async fn send_keys(&self, finder: &Finder, keys: &str) -> VeoResult<()> {
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.send_keys(&id, keys)).await
    }

    /// Clear an input
    pub async fn clear(&self, finder: &Finder) -> VeoResult<()> {
        let id = self.find(finder).await?;
        self.flow.execute(self.driver.clear(&id)).await
    }

    /// Set an input value programmatically and notify AngularJS
    pub async fn set_input_value(&self, finder: &Finder, value: impl Into<Value>) -> VeoResult<()> {
        let id = self.find(finder).await?;
        self.execute_script(
            scripts::SET_INPUT_VALUE,
            vec![ScriptArg::Element(id), ScriptArg::Value(value.into())],
        )
        .await
        .map(|_| ())
    }

    // ------------------------------------------------------------------
    // Waits
    // ------------------------------------------------------------------

    /// Wait for `expectation`, failing with `message` after `timeout_ms`
    pub async fn wait(
        &self,
        expectation: Expectation,
        timeout_ms: u64,
        message: &str,
    ) -> VeoResult<()> {
        let poll = self.config.timeouts.poll_interval_ms;
        poll_until(timeout_ms, poll, message, || self.holds(&expectation)).await
    }

    /// Evaluate an expectation once
    pub fn holds<'a>(&'a self, expectation: &'a Expectation) -> BoxFuture<'a, VeoResult<bool>> {
        Box::pin(async move {
            let outcome = match expectation {
                Expectation::Visible(finder) => self.is_visible(finder).await,
                Expectation::Invisible(finder) => self.is_visible(finder).await.map(|v| !v),
                Expectation::Present(finder) => self.is_present(finder).await,
                Expectation::Absent(finder) => self.is_present(finder).await.map(|p| !p),
                Expectation::Clickable(finder) => self.is_clickable(finder).await,
                Expectation::All(all) => {
                    let mut outcome = Ok(true);
                    for e in all {
                        match self.holds(e).await {
                            Ok(true) => {}
                            other => {
                                outcome = other;
                                break;
                            }
                        }
                    }
                    outcome
                }
            };
            match outcome {
                Err(VeoError::StaleElement { .. }) => Ok(false),
                other => other,
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{El, MockApp, MockBrowser, MockEvent, Reaction};

    /// Hovering the button reveals the menu; clicking the button hides it
    #[derive(Debug, Default)]
    struct HoverApp {
        hovered: bool,
        clicks: usize,
    }

    impl MockApp for HoverApp {
        fn render(&self) -> El {
            El::new("body").child(
                El::new("div").id("page-content-wrapper").children([
                    El::new("button").class("toggle").text(format!("clicked {}", self.clicks)),
                    El::new("ul")
                        .class("menu")
                        .hidden(!self.hovered)
                        .child(El::new("li").text("entry")),
                    El::new("button").class("disabled").attr("disabled", "disabled"),
                    El::new("select").child(El::new("option").text("one")),
                ]),
            )
        }

        fn path(&self) -> String {
            "be/".to_string()
        }

        fn navigate(&mut self, _path: &str) {}

        fn handle(&mut self, event: &MockEvent) -> Reaction {
            match event {
                MockEvent::Hover(node) if node.attr("class") == Some("toggle") => {
                    self.hovered = true;
                    Reaction::rerender()
                }
                MockEvent::Click(node) if node.tag == "button" => {
                    self.clicks += 1;
                    Reaction::rerender()
                }
                _ => Reaction::ignored(),
            }
        }
    }

    fn session() -> (Session, Arc<MockBrowser<HoverApp>>) {
        let browser = Arc::new(MockBrowser::new("http://localhost/", HoverApp::default()));
        let session = Session::new(browser.clone(), TestConfig::new("http://localhost/"));
        (session, browser)
    }

    mod resolution_tests {
        use super::*;

        #[tokio::test]
        async fn test_nth_and_missing() {
            let (session, _) = session();
            let buttons = Finder::css("button");
            assert_eq!(session.count(&buttons).await.unwrap(), 2);
            assert_eq!(session.text(&buttons.first()).await.unwrap(), "clicked 0");
            assert!(session.find(&buttons.nth(5)).await.is_err());
            assert!(!session.is_present(&Finder::css(".nothing")).await.unwrap());
            assert!(!session.is_visible(&Finder::css(".menu")).await.unwrap());
        }

        #[tokio::test]
        async fn test_parent_and_class() {
            let (session, _) = session();
            let wrapper = Finder::css("li").first().parent();
            assert!(session.has_class(&wrapper, "menu").await.unwrap());
            assert_eq!(session.tag_name(&wrapper).await.unwrap(), "ul");
        }
    }

    mod click_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_survives_hover_rerender() {
            let (session, browser) = session();
            let toggle = Finder::css(".toggle");
            session.click(&toggle).await.unwrap();
            assert_eq!(session.text(&toggle).await.unwrap(), "clicked 1");
            assert!(session.is_visible(&Finder::css(".menu")).await.unwrap());
            assert!(browser.was_called("wait_for_angular"));
            assert!(browser.was_called("mouse_move:"));
        }

        #[tokio::test]
        async fn test_option_clicked_directly() {
            let (session, browser) = session();
            session.click(&Finder::css("option")).await.unwrap();
            assert!(!browser.was_called("mouse_move:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_disabled_element_times_out() {
            let (session, _) = session();
            let err = session.click(&Finder::css(".disabled")).await.unwrap_err();
            match err {
                VeoError::Timeout { message, ms } => {
                    assert_eq!(message, "Element is not clickable");
                    assert_eq!(ms, 1000);
                }
                other => panic!("unexpected error {other}"),
            }
        }
    }

    mod wait_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_all_expectation() {
            let (session, _) = session();
            let expectation = Expectation::All(vec![
                Expectation::Present(Finder::css(".menu")),
                Expectation::Invisible(Finder::css(".menu")),
                Expectation::Absent(Finder::css(".nothing")),
            ]);
            session.wait(expectation, 100, "never").await.unwrap();
            let err = session
                .wait(Expectation::Visible(Finder::css(".menu")), 200, "Menu not visible")
                .await
                .unwrap_err();
            assert!(err.to_string().starts_with("Menu not visible"));
        }

        #[tokio::test]
        async fn test_take_screenshot_writes_png() {
            let (session, _) = session();
            let dir = tempfile::tempdir().unwrap();
            let path = session.take_screenshot(dir.path(), "home").await.unwrap();
            assert!(path.ends_with("home.png"));
            assert!(std::fs::read(path).unwrap().starts_with(&[0x89, b'P', b'N', b'G']));
        }
    }
}
