//! WebDriver - Abstract Browser Automation Trait
//!
//! Page objects, fields and helpers only talk to the browser through
//! [`WebDriver`], which allows swapping implementations:
//!
//! - [`crate::mock::MockBrowser`] - in-memory document, used by the test suite
//! - `ChromiumDriver` - CDP via chromiumoxide (feature `browser`)
//!
//! Every method is a leaf operation: callers schedule them through the
//! [`crate::flow::ControlFlow`] so they run in program order.

use crate::locator::{Locator, Point};
use crate::result::VeoResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to an element of the current document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(String);

impl ElementId {
    /// Wrap a driver-specific id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Driver-specific id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Argument handed to a page script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScriptArg {
    /// Element reference, exposed to the script as a DOM node
    Element(ElementId),
    /// Plain JSON value
    Value(serde_json::Value),
}

impl From<ElementId> for ScriptArg {
    fn from(id: ElementId) -> Self {
        Self::Element(id)
    }
}

impl From<serde_json::Value> for ScriptArg {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Special keys understood by `send_keys`
pub mod keys {
    /// Enter key
    pub const ENTER: &str = "\u{E007}";
    /// Backspace key
    pub const BACK_SPACE: &str = "\u{E003}";
    /// Tab key
    pub const TAB: &str = "\u{E004}";
}

/// Screenshot data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screenshot {
    /// PNG data
    pub data: Vec<u8>,
}

impl Screenshot {
    /// Create a new screenshot
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Get size in bytes
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Check if the data starts with the PNG signature
    #[must_use]
    pub fn is_png(&self) -> bool {
        self.data.starts_with(&[0x89, b'P', b'N', b'G'])
    }
}

/// Abstract driver trait for browser automation
#[async_trait]
pub trait WebDriver: Send + Sync {
    /// Navigate to an absolute URL
    async fn get(&self, url: &str) -> VeoResult<()>;

    /// Current URL
    async fn current_url(&self) -> VeoResult<String>;

    /// Document title
    async fn title(&self) -> VeoResult<String>;

    /// Reload the current page
    async fn refresh(&self) -> VeoResult<()>;

    /// Remove every cookie of the session
    async fn delete_all_cookies(&self) -> VeoResult<()>;

    /// Resize the browser window
    async fn set_window_size(&self, width: u32, height: u32) -> VeoResult<()>;

    /// Take a PNG screenshot
    async fn screenshot(&self) -> VeoResult<Screenshot>;

    /// Elements matching `locator`, under `scope` when given
    async fn find_elements(
        &self,
        scope: Option<&ElementId>,
        locator: &Locator,
    ) -> VeoResult<Vec<ElementId>>;

    /// Visible text of the element
    async fn text(&self, element: &ElementId) -> VeoResult<String>;

    /// Attribute or property value
    async fn attribute(&self, element: &ElementId, name: &str) -> VeoResult<Option<String>>;

    /// Lower-case tag name
    async fn tag_name(&self, element: &ElementId) -> VeoResult<String>;

    /// Whether the element is rendered
    async fn is_displayed(&self, element: &ElementId) -> VeoResult<bool>;

    /// Whether the element accepts interaction
    async fn is_enabled(&self, element: &ElementId) -> VeoResult<bool>;

    /// Position of the element in the page
    async fn location(&self, element: &ElementId) -> VeoResult<Point>;

    /// Click the element
    async fn click(&self, element: &ElementId) -> VeoResult<()>;

    /// Move the mouse over the element
    async fn mouse_move(&self, element: &ElementId) -> VeoResult<()>;

    /// Type keys into the element
    async fn send_keys(&self, element: &ElementId, keys: &str) -> VeoResult<()>;

    /// Clear an input element
    async fn clear(&self, element: &ElementId) -> VeoResult<()>;

    /// Run a synchronous script in page context
    async fn execute_script(
        &self,
        script: &str,
        args: Vec<ScriptArg>,
    ) -> VeoResult<serde_json::Value>;

    /// Wait until AngularJS has no pending work
    async fn wait_for_angular(&self) -> VeoResult<()>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    mod element_id_tests {
        use super::*;

        #[test]
        fn test_display_and_as_str() {
            let id = ElementId::new("3:17");
            assert_eq!(id.as_str(), "3:17");
            assert_eq!(id.to_string(), "3:17");
        }

        #[test]
        fn test_script_arg_from() {
            let arg: ScriptArg = ElementId::new("1").into();
            assert_eq!(arg, ScriptArg::Element(ElementId::new("1")));
            let arg: ScriptArg = serde_json::json!(4).into();
            assert_eq!(arg, ScriptArg::Value(serde_json::json!(4)));
        }
    }

    mod screenshot_tests {
        use super::*;

        #[test]
        fn test_png_signature() {
            let shot = Screenshot::new(vec![0x89, b'P', b'N', b'G', 0x0D]);
            assert!(shot.is_png());
            assert_eq!(shot.size_bytes(), 5);
            assert!(!Screenshot::new(vec![1, 2]).is_png());
        }
    }
}
