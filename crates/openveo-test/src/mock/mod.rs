//! In-memory browser and fake back office pages.
//!
//! [`MockBrowser`] implements [`crate::driver::WebDriver`] over a document
//! rendered by a [`MockApp`]. The apps shipped here reproduce the markup of the
//! back office closely enough for page objects and fields to run unchanged:
//!
//! - [`FakeBackOffice`] for login, menus, alerts and the entity table
//! - [`FakeForm`] for every field kind
//! - [`StaticApp`] for a fixed document

pub mod back_office;
mod browser;
mod dom;
pub mod form;

pub use self::back_office::{EntityForms, FakeBackOffice, MenuItem};
pub use self::browser::{
    MockApp, MockBrowser, MockEvent, NodeView, Reaction, ScriptValue, StaticApp, BLANK_PNG,
};
pub use self::dom::{CssSelector, Dom, El, Node, NodeId};
pub use self::form::FakeForm;
