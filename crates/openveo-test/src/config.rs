//! Test run configuration.
//!
//! One [`TestConfig`] value is built per test run and handed to sessions,
//! pages and helpers. It carries the application base URL, the test accounts,
//! the environment connection settings and the wait budgets.

use crate::result::{VeoError, VeoResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "OPENVEO_TEST_BASE_URL";

/// Environment variable overriding the screenshot directory
pub const SCREENSHOT_DIR_ENV: &str = "OPENVEO_TEST_SCREENSHOT_DIR";

/// Default short wait (add form, actions list, clickable elements)
pub const DEFAULT_SHORT_WAIT_MS: u64 = 1000;

/// Default long wait (dialogs, opened lines, sub menus, login form)
pub const DEFAULT_LONG_WAIT_MS: u64 = 5000;

/// Default polling interval for waits
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// A test account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Login password
    pub password: String,
}

impl User {
    /// Create a new account
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Test accounts known to the run
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Users {
    /// Super administrator account
    pub super_admin: Option<User>,
    /// Other accounts by id
    #[serde(default, flatten)]
    pub others: BTreeMap<String, User>,
}

impl Users {
    /// Look an account up by id (`super_admin` included)
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&User> {
        if id == "super_admin" {
            self.super_admin.as_ref()
        } else {
            self.others.get(id)
        }
    }
}

/// Environment connection settings (external authentication providers)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    /// CAS attribute holding the user id
    pub cas_user_id_attribute: String,
    /// CAS attribute holding the user name
    pub cas_user_name_attribute: String,
    /// CAS attribute holding the user email
    pub cas_user_email_attribute: String,
    /// CAS attribute holding the user groups
    pub cas_user_group_attribute: String,
    /// LDAP attribute holding the user id
    pub ldap_user_id_attribute: String,
    /// LDAP attribute holding the user name
    pub ldap_user_name_attribute: String,
    /// LDAP attribute holding the user email
    pub ldap_user_email_attribute: String,
    /// LDAP attribute holding the user groups
    pub ldap_user_group_attribute: String,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            cas_user_id_attribute: "uid".to_string(),
            cas_user_name_attribute: "name".to_string(),
            cas_user_email_attribute: "mail".to_string(),
            cas_user_group_attribute: "groups".to_string(),
            ldap_user_id_attribute: "dn".to_string(),
            ldap_user_name_attribute: "cn".to_string(),
            ldap_user_email_attribute: "mail".to_string(),
            ldap_user_group_attribute: "groups".to_string(),
        }
    }
}

/// Wait budgets in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Short wait
    pub short_ms: u64,
    /// Long wait
    pub long_ms: u64,
    /// Polling interval
    pub poll_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            short_ms: DEFAULT_SHORT_WAIT_MS,
            long_ms: DEFAULT_LONG_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Screenshot on failure settings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotSettings {
    /// Whether failed tests are captured
    pub enabled: bool,
    /// Output directory
    pub directory: Option<PathBuf>,
}

/// Configuration for one test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestConfig {
    /// Application base URL, with trailing slash
    pub base_url: String,
    /// Test accounts
    #[serde(default)]
    pub users: Users,
    /// Environment connection settings
    #[serde(default)]
    pub environment: EnvironmentSettings,
    /// Wait budgets
    #[serde(default)]
    pub timeouts: Timeouts,
    /// Screenshot on failure settings
    #[serde(default)]
    pub screenshots: ScreenshotSettings,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/".to_string(),
            users: Users::default(),
            environment: EnvironmentSettings::default(),
            timeouts: Timeouts::default(),
            screenshots: ScreenshotSettings::default(),
        }
    }
}

impl TestConfig {
    /// Configuration with the given base URL
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Set the base URL, appending the trailing slash when missing
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut url = base_url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        self.base_url = url;
        self
    }

    /// Set the super administrator account
    #[must_use]
    pub fn with_super_admin(mut self, user: User) -> Self {
        self.users.super_admin = Some(user);
        self
    }

    /// Add a named account
    #[must_use]
    pub fn with_user(mut self, id: impl Into<String>, user: User) -> Self {
        self.users.others.insert(id.into(), user);
        self
    }

    /// Set the wait budgets
    #[must_use]
    pub const fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Capture failed tests into `directory`
    #[must_use]
    pub fn with_screenshots(mut self, directory: impl Into<PathBuf>) -> Self {
        self.screenshots = ScreenshotSettings {
            enabled: true,
            directory: Some(directory.into()),
        };
        self
    }

    /// Absolute URL of an application path
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Load a JSON or YAML file (by extension), then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> VeoResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content)?,
            Some("yml" | "yaml") => Self::from_yaml(&content)?,
            other => {
                return Err(VeoError::Config {
                    message: format!(
                        "unsupported configuration format {:?} for {}",
                        other.unwrap_or(""),
                        path.display()
                    ),
                })
            }
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    /// Parse a JSON document
    pub fn from_json(content: &str) -> VeoResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validated()
    }

    /// Parse a YAML document
    pub fn from_yaml(content: &str) -> VeoResult<Self> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validated()
    }

    /// Apply overrides read through `lookup`
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(BASE_URL_ENV) {
            self = self.with_base_url(url);
        }
        if let Some(dir) = lookup(SCREENSHOT_DIR_ENV) {
            self = self.with_screenshots(dir);
        }
        self
    }

    fn validated(self) -> VeoResult<Self> {
        if self.base_url.is_empty() {
            return Err(VeoError::Config {
                message: "base_url must not be empty".to_string(),
            });
        }
        let url = self.base_url.clone();
        Ok(self.with_base_url(url))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod builder_tests {
        use super::*;

        #[test]
        fn test_base_url_gets_trailing_slash() {
            let config = TestConfig::new("http://localhost:3000");
            assert_eq!(config.base_url, "http://localhost:3000/");
            assert_eq!(config.url("be/login"), "http://localhost:3000/be/login");
            assert_eq!(config.url("/be/"), "http://localhost:3000/be/");
        }

        #[test]
        fn test_users() {
            let config = TestConfig::default()
                .with_super_admin(User::new("admin", "admin@veo-labs.com", "secret"))
                .with_user("guest", User::new("guest", "guest@veo-labs.com", "guest"));
            assert_eq!(config.users.get("super_admin").unwrap().name, "admin");
            assert_eq!(config.users.get("guest").unwrap().password, "guest");
            assert!(config.users.get("nobody").is_none());
        }

        #[test]
        fn test_default_timeouts() {
            let config = TestConfig::default();
            assert_eq!(config.timeouts.short_ms, 1000);
            assert_eq!(config.timeouts.long_ms, 5000);
            assert!(!config.screenshots.enabled);
        }
    }

    mod loading_tests {
        use super::*;
        use std::io::Write;

        #[test]
        fn test_from_json() {
            let config = TestConfig::from_json(
                r#"{
                    "base_url": "http://127.0.0.1:3003",
                    "users": {
                        "super_admin": {"name": "admin", "email": "a@b.c", "password": "p"}
                    },
                    "environment": {"cas_user_name_attribute": "displayName"}
                }"#,
            )
            .unwrap();
            assert_eq!(config.base_url, "http://127.0.0.1:3003/");
            assert_eq!(config.environment.cas_user_name_attribute, "displayName");
            assert_eq!(config.environment.ldap_user_name_attribute, "cn");
            assert_eq!(config.users.super_admin.unwrap().email, "a@b.c");
        }

        #[test]
        fn test_from_yaml() {
            let config = TestConfig::from_yaml(
                "base_url: http://localhost:8080/\ntimeouts:\n  long_ms: 8000\n",
            )
            .unwrap();
            assert_eq!(config.timeouts.long_ms, 8000);
            assert_eq!(config.timeouts.short_ms, 1000);
        }

        #[test]
        fn test_empty_base_url_rejected() {
            let err = TestConfig::from_json(r#"{"base_url": ""}"#).unwrap_err();
            assert!(matches!(err, VeoError::Config { .. }));
        }

        #[test]
        fn test_load_yaml_file() {
            let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
            writeln!(file, "base_url: http://localhost:9000").unwrap();
            let config = TestConfig::load(file.path()).unwrap();
            assert!(config.base_url.ends_with('/'));
        }

        #[test]
        fn test_load_unknown_extension() {
            let file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
            let err = TestConfig::load(file.path()).unwrap_err();
            assert!(matches!(err, VeoError::Config { .. }));
        }

        #[test]
        fn test_env_overrides() {
            let config = TestConfig::default().with_env_overrides(|key| match key {
                BASE_URL_ENV => Some("http://ci:4000".to_string()),
                SCREENSHOT_DIR_ENV => Some("/tmp/shots".to_string()),
                _ => None,
            });
            assert_eq!(config.base_url, "http://ci:4000/");
            assert!(config.screenshots.enabled);
            assert_eq!(config.screenshots.directory, Some(PathBuf::from("/tmp/shots")));
        }
    }
}
