//! Screenshots of failed tests.
//!
//! Pictures land in `<directory>/<run id>/<browser>/<category>/<test>.png`.
//! The run id is computed once per reporter from the local date
//! (`MDYYYY-<epoch ms>`, without zero padding) so every failure of a run
//! shares the same folder.

use crate::config::TestConfig;
use crate::result::VeoResult;
use crate::session::Session;
use chrono::{DateTime, Datelike, Local, TimeZone};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Run id of a run started at `start`
#[must_use]
pub fn run_id<Tz: TimeZone>(start: &DateTime<Tz>) -> String {
    format!(
        "{}{}{}-{}",
        start.month(),
        start.day(),
        start.year(),
        start.timestamp_millis()
    )
}

/// File system friendly version of a test or category name: lower case,
/// spaces turned into dashes, quotes, pipes and slashes removed
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.replace(' ', "-")
        .chars()
        .filter(|c| !matches!(c, '"' | '|' | '\\' | '/'))
        .collect::<String>()
        .to_lowercase()
}

/// Writes a screenshot for every failed test
#[derive(Debug, Clone)]
pub struct ScreenshotReporter {
    directory: PathBuf,
    run_id: String,
    browser: String,
}

impl ScreenshotReporter {
    /// Reporter writing under `directory` for `browser` (e.g. `"chrome"`)
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>, browser: &str) -> Self {
        Self {
            directory: directory.into(),
            run_id: run_id(&Local::now()),
            browser: browser.to_lowercase().replace(' ', "-"),
        }
    }

    /// Reporter described by the configuration, `None` when screenshots are
    /// disabled or no directory is set
    #[must_use]
    pub fn from_config(config: &TestConfig, browser: &str) -> Option<Self> {
        let settings = &config.screenshots;
        if !settings.enabled {
            return None;
        }
        settings
            .directory
            .as_ref()
            .map(|directory| Self::new(directory.clone(), browser))
    }

    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Folder of the screenshots of `category`
    #[must_use]
    pub fn category_directory(&self, category: &str) -> PathBuf {
        self.directory
            .join(&self.run_id)
            .join(&self.browser)
            .join(sanitize_name(category))
    }

    /// Full path of the screenshot of `test`
    #[must_use]
    pub fn screenshot_path(&self, category: &str, test: &str) -> PathBuf {
        self.category_directory(category)
            .join(format!("{}.png", sanitize_name(test)))
    }

    /// Capture the page when the test failed, returning the written file
    pub async fn post_test(
        &self,
        session: &Session,
        passed: bool,
        category: &str,
        test: &str,
    ) -> VeoResult<Option<PathBuf>> {
        if passed {
            return Ok(None);
        }
        let directory = self.category_directory(category);
        match session.take_screenshot(&directory, &sanitize_name(test)).await {
            Ok(path) => {
                info!(path = %path.display(), "failure screenshot");
                Ok(Some(path))
            }
            Err(e) => {
                warn!(error = %e, test, "failure screenshot not written");
                Err(e)
            }
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::mock::{El, MockBrowser, StaticApp};
    use chrono::Utc;
    use proptest::prelude::*;
    use std::sync::Arc;

    mod naming_tests {
        use super::*;

        #[test]
        fn test_run_id_has_no_padding() {
            let start = Utc.with_ymd_and_hms(2026, 3, 7, 10, 0, 0).unwrap();
            assert_eq!(run_id(&start), format!("372026-{}", start.timestamp_millis()));
        }

        #[test]
        fn test_sanitize_name() {
            assert_eq!(sanitize_name("Table page"), "table-page");
            assert_eq!(sanitize_name("should \"remove\" a/b|c\\d"), "should-remove-abcd");
        }

        #[test]
        fn test_screenshot_path() {
            let reporter =
                ScreenshotReporter::new("/tmp/shots", "Internet Explorer").with_run_id("372026-1");
            assert_eq!(
                reporter.screenshot_path("Users page", "should add a user"),
                PathBuf::from("/tmp/shots/372026-1/internet-explorer/users-page/should-add-a-user.png")
            );
        }

        #[test]
        fn test_from_config() {
            let config = TestConfig::new("http://localhost/");
            assert!(ScreenshotReporter::from_config(&config, "chrome").is_none());
            let config = config.with_screenshots("/tmp/shots");
            let reporter = ScreenshotReporter::from_config(&config, "chrome").unwrap();
            assert_eq!(reporter.directory(), Path::new("/tmp/shots"));
        }

        proptest! {
            #[test]
            fn prop_sanitized_names_are_path_safe(name in ".*") {
                let sanitized = sanitize_name(&name);
                prop_assert!(!sanitized.contains(['/', '\\', '"', '|', ' ']));
            }
        }
    }

    mod capture_tests {
        use super::*;

        fn session() -> Session {
            let browser = Arc::new(MockBrowser::new(
                "http://localhost/",
                StaticApp::new("be/", El::new("body")),
            ));
            Session::new(browser, TestConfig::new("http://localhost/"))
        }

        #[tokio::test]
        async fn test_failed_test_captured() {
            let dir = tempfile::tempdir().unwrap();
            let reporter = ScreenshotReporter::new(dir.path(), "chrome").with_run_id("run");
            let path = reporter
                .post_test(&session(), false, "Videos", "should list videos")
                .await
                .unwrap()
                .unwrap();
            assert_eq!(path, dir.path().join("run/chrome/videos/should-list-videos.png"));
            assert!(path.exists());
        }

        #[tokio::test]
        async fn test_passed_test_ignored() {
            let dir = tempfile::tempdir().unwrap();
            let reporter = ScreenshotReporter::new(dir.path(), "chrome");
            assert!(reporter.post_test(&session(), true, "Videos", "ok").await.unwrap().is_none());
            assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        }
    }
}
