//! Result and error types for OpenVeo tests.

use thiserror::Error;

/// Result type for OpenVeo test operations
pub type VeoResult<T> = Result<T, VeoError>;

fn in_parentheses(cause: Option<&str>) -> String {
    cause.map(|c| format!(" ({c})")).unwrap_or_default()
}

/// Errors that can occur while driving the OpenVeo back office
#[derive(Debug, Error)]
pub enum VeoError {
    /// A form field could not be located by its label
    #[error("\"{name}\" field not found{}", in_parentheses(cause.as_deref()))]
    FieldNotFound {
        /// Field name (label text)
        name: String,
        /// Underlying lookup failure, if any
        cause: Option<String>,
    },

    /// Field configuration without a name
    #[error("Missing field name")]
    MissingFieldName,

    /// Field type name that does not map to a known widget
    #[error("Unknown field type \"{kind}\"")]
    UnknownFieldType {
        /// Type name as found in configuration
        kind: String,
    },

    /// Value of the wrong shape handed to a field
    #[error("Invalid value for field \"{name}\": {message}")]
    InvalidFieldValue {
        /// Field name
        name: String,
        /// Error message
        message: String,
    },

    /// Autocompletion suggestion missing from the live list
    #[error("Suggestion \"{value}\" not found")]
    SuggestionNotFound {
        /// Requested suggestion
        value: String,
    },

    /// No table line holds a cell with the given text
    #[error("No lines corresponding to {name}")]
    LineNotFound {
        /// Searched cell text
        name: String,
    },

    /// Table is empty
    #[error("No lines")]
    NoLines,

    /// Pagination has no link for this page
    #[error("No page {page} found")]
    PageNotFound {
        /// Requested page (1-indexed)
        page: usize,
    },

    /// Column header missing when sorting
    #[error("Table header \"{name}\" not found")]
    HeaderNotFound {
        /// Header text
        name: String,
    },

    /// Column header missing when reading values
    #[error("No header corresponding to {name}")]
    NoHeader {
        /// Header text
        name: String,
    },

    /// Items per page link missing
    #[error("No element found for {count} items per page")]
    ItemsPerPageNotFound {
        /// Requested number of items per page
        count: usize,
    },

    /// Menu item missing at every level of the menu
    #[error("Item \"{name}\" not found")]
    MenuItemNotFound {
        /// Menu item label
        name: String,
    },

    /// Search field id missing from the page registry
    #[error("Unknown search field \"{id}\"")]
    UnknownSearchField {
        /// Search field id
        id: String,
    },

    /// Locator resolved to nothing
    #[error("No element found using locator: {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// Element handle no longer attached to the document
    #[error("Stale element reference: {id}")]
    StaleElement {
        /// Element id
        id: String,
    },

    /// Bounded wait expired
    #[error("{message} (timed out after {ms}ms)")]
    Timeout {
        /// Static description of the awaited condition
        message: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Operation a concrete page or helper must provide
    #[error("Method {operation} is not implemented")]
    NotImplemented {
        /// Operation name
        operation: String,
    },

    /// Page landed on an unexpected URL
    #[error("Failed loading page {expected} (got {actual})")]
    PageLoad {
        /// Expected URL
        expected: String,
        /// URL reported by the browser
        actual: String,
    },

    /// Browser driver error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Script evaluation in page context failed
    #[error("Script error: {message}")]
    Script {
        /// Error message
        message: String,
    },

    /// Fixture store error
    #[error("Store error: {message}")]
    Store {
        /// Error message
        message: String,
    },

    /// Translation dictionary error
    #[error("Translation error: {message}")]
    Translation {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl VeoError {
    /// Build a `NotImplemented` error for the given operation
    #[must_use]
    pub fn not_implemented(operation: impl Into<String>) -> Self {
        Self::NotImplemented {
            operation: operation.into(),
        }
    }

    /// Build an `AssertionFailed` error
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Build a `Timeout` error
    #[must_use]
    pub fn timeout(message: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            message: message.into(),
            ms,
        }
    }

    /// Whether this error reports a missing element (as opposed to a broken session)
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::ElementNotFound { .. }
                | Self::FieldNotFound { .. }
                | Self::LineNotFound { .. }
                | Self::PageNotFound { .. }
                | Self::HeaderNotFound { .. }
                | Self::NoHeader { .. }
                | Self::MenuItemNotFound { .. }
                | Self::SuggestionNotFound { .. }
                | Self::ItemsPerPageNotFound { .. }
        )
    }
}
