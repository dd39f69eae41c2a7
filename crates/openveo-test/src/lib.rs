//! openveo-test: end-to-end test support for the OpenVeo back office
//!
//! Page objects, form fields, fixtures and table assertions for driving the
//! AngularJS back office through a browser.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                      openveo-test layers                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │   ┌─────────────┐   ┌─────────────┐   ┌──────────────────────┐   │
//! │   │ TableAssert │──►│ Page object │──►│ Session              │   │
//! │   │ Helper      │   │ Field       │   │ (ControlFlow, waits) │   │
//! │   └─────────────┘   └─────────────┘   └──────────┬───────────┘   │
//! │                                                  ▼               │
//! │                                    ┌──────────────────────────┐  │
//! │                                    │ WebDriver                │  │
//! │                                    │ MockBrowser / Chromium   │  │
//! │                                    └──────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every browser command goes through the [`Session`], which schedules it on
//! the shared [`ControlFlow`] so commands run in program order.

// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_frames))]

/// Table checks run against fixture lines
pub mod assertions;
/// Configuration files and environment overrides
pub mod config;
pub mod driver;
pub mod fields;
pub mod flow;
/// Fixture entities and their store
pub mod helper;
/// Translation dictionaries
pub mod i18n;
pub mod locator;
pub mod logging;
pub mod mock;
pub mod pages;
mod result;
pub mod screenshot;
/// Page scripts run through `execute_script`
pub mod scripts;
mod session;
pub mod wait;

#[cfg(feature = "browser")]
pub mod chromium;

pub use assertions::TableAssert;
pub use config::{TestConfig, User};
pub use driver::{ElementId, Screenshot, ScriptArg, WebDriver};
pub use fields::{Field, FieldConfig, FieldKind, FieldValue};
pub use flow::ControlFlow;
pub use helper::{Entity, EntityStore, Helper, MemoryStore};
pub use locator::{Finder, Locator, Point};
pub use pages::{BackEnd, BackEndPage, Page, Table, TableForms, TablePage};
pub use result::{VeoError, VeoResult};
pub use session::Session;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumConfig, ChromiumDriver};

/// Everything a test file usually needs
pub mod prelude {
    pub use super::assertions::TableAssert;
    pub use super::config::{TestConfig, User};
    pub use super::driver::{keys, ElementId, WebDriver};
    pub use super::fields::{Field, FieldConfig, FieldKind, FieldValue, MatchValue};
    pub use super::flow::ControlFlow;
    pub use super::helper::{Entity, EntityStore, Helper, MemoryStore};
    pub use super::i18n::{MemoryTranslations, TranslationSource};
    pub use super::locator::{Finder, Locator};
    pub use super::pages::{
        BackEnd, BackEndPage, Line, LineTarget, NoForms, Page, Table, TableForms, TablePage,
    };
    pub use super::result::{VeoError, VeoResult};
    pub use super::session::Session;
    pub use super::wait::Expectation;

    #[cfg(feature = "browser")]
    pub use super::chromium::{ChromiumConfig, ChromiumDriver};
}
