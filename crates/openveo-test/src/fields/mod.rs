//! Form fields of the back office.
//!
//! A field is identified by the text of its label inside a scoping element.
//! [`Field::get`] turns a [`FieldConfig`] into one of the concrete widgets, all
//! of them answering the same `get_value` / `set_value` / `clear` /
//! `is_on_error` protocol through [`FieldValue`].
//!
//! ```no_run
//! # use openveo_test::prelude::*;
//! # async fn demo(session: Session) -> VeoResult<()> {
//! let publish = Field::get(&session, FieldConfig::new(FieldKind::Checkbox, "Publish"))?;
//! publish.set_value(&FieldValue::Flag(true)).await?;
//! assert!(matches!(publish.get_value().await?, FieldValue::Text(_)));
//! # Ok(())
//! # }
//! ```

mod checkbox;
mod common;
mod date;
mod fake;
mod match_field;
mod rich_text;
mod select;
mod tags;
mod text;

pub use self::checkbox::{CheckboxField, CheckboxesField};
pub use self::common::{normalize_label, strip_required_marker, FieldCore};
pub use self::date::{
    parse_date, parse_time, DateField, DateTimeField, TimeField, SHORT_DATE_FORMAT,
};
pub use self::fake::FakeField;
pub use self::match_field::{MatchField, MatchValue};
pub use self::rich_text::RichTextField;
pub use self::select::SelectField;
pub use self::tags::TagsField;
pub use self::text::{AutoCompleteField, TextField};

use crate::locator::Finder;
use crate::result::{VeoError, VeoResult};
use crate::session::Session;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Widget type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Textarea,
    /// TinyMCE editor
    #[serde(rename = "tinymce")]
    RichText,
    Select,
    Checkbox,
    Checkboxes,
    Date,
    DateTime,
    Time,
    Tags,
    Match,
    AutoComplete,
    /// Static text
    Fake,
}

impl FieldKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 13] = [
        Self::Text,
        Self::Textarea,
        Self::RichText,
        Self::Select,
        Self::Checkbox,
        Self::Checkboxes,
        Self::Date,
        Self::DateTime,
        Self::Time,
        Self::Tags,
        Self::Match,
        Self::AutoComplete,
        Self::Fake,
    ];

    /// Configuration name of the kind
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Textarea => "textarea",
            Self::RichText => "tinymce",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Checkboxes => "checkboxes",
            Self::Date => "date",
            Self::DateTime => "dateTime",
            Self::Time => "time",
            Self::Tags => "tags",
            Self::Match => "match",
            Self::AutoComplete => "autoComplete",
            Self::Fake => "fake",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = VeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| VeoError::UnknownFieldType { kind: s.to_string() })
    }
}

/// Where and what a field is
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConfig {
    pub kind: FieldKind,
    /// Label text, without required marker
    pub name: String,
    /// Element the label is searched in
    pub base: Finder,
    /// Options accepted by auto-completed tags
    pub available_options: Vec<String>,
}

impl FieldConfig {
    /// Field searched in the whole page
    #[must_use]
    pub fn new(kind: FieldKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            base: Finder::css("body"),
            available_options: Vec::new(),
        }
    }

    /// Field from a configuration type name (`"text"`, `"dateTime"`, ...)
    pub fn from_type(kind: &str, name: impl Into<String>) -> VeoResult<Self> {
        Ok(Self::new(kind.parse()?, name))
    }

    /// Search the label inside `base`
    #[must_use]
    pub fn within(mut self, base: Finder) -> Self {
        self.base = base;
        self
    }

    #[must_use]
    pub fn with_available_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_options = options.into_iter().map(Into::into).collect();
        self
    }
}

/// Value read from or written to a field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum FieldValue {
    /// Nothing: unchecked checkbox, unset date, cleared field
    #[default]
    None,
    Text(String),
    Flag(bool),
    List(Vec<String>),
    Matches(Vec<MatchValue>),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(list) => Some(list),
            _ => None,
        }
    }

    const fn shape(&self) -> &'static str {
        match self {
            Self::None => "nothing",
            Self::Text(_) => "a text",
            Self::Flag(_) => "a flag",
            Self::List(_) => "a list",
            Self::Matches(_) => "matches",
            Self::DateTime(_) => "a date and time",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(text: Option<String>) -> Self {
        text.map_or(Self::None, Self::Text)
    }
}

impl From<bool> for FieldValue {
    fn from(flag: bool) -> Self {
        Self::Flag(flag)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(list: Vec<String>) -> Self {
        Self::List(list)
    }
}

impl From<Vec<MatchValue>> for FieldValue {
    fn from(matches: Vec<MatchValue>) -> Self {
        Self::Matches(matches)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

/// Any field of the back office
#[derive(Debug, Clone)]
pub enum Field {
    Text(TextField),
    Textarea(TextField),
    RichText(RichTextField),
    Select(SelectField),
    Checkbox(CheckboxField),
    Checkboxes(CheckboxesField),
    Date(DateField),
    DateTime(DateTimeField),
    Time(TimeField),
    Tags(TagsField),
    Match(MatchField),
    AutoComplete(AutoCompleteField),
    Fake(FakeField),
}

impl Field {
    /// Build the field described by `config`
    pub fn get(session: &Session, config: FieldConfig) -> VeoResult<Self> {
        let core = FieldCore::new(session.clone(), config.name, config.base)?;
        Ok(match config.kind {
            FieldKind::Text => Self::Text(TextField::input(core)),
            FieldKind::Textarea => Self::Textarea(TextField::textarea(core)),
            FieldKind::RichText => Self::RichText(RichTextField::new(core)),
            FieldKind::Select => Self::Select(SelectField::new(core)),
            FieldKind::Checkbox => Self::Checkbox(CheckboxField::new(core)),
            FieldKind::Checkboxes => Self::Checkboxes(CheckboxesField::new(core)),
            FieldKind::Date => Self::Date(DateField::new(core)),
            FieldKind::DateTime => Self::DateTime(DateTimeField::new(core)),
            FieldKind::Time => Self::Time(TimeField::new(core)),
            FieldKind::Tags => {
                Self::Tags(TagsField::new(core).with_available_options(config.available_options))
            }
            FieldKind::Match => Self::Match(MatchField::new(core, config.available_options)),
            FieldKind::AutoComplete => Self::AutoComplete(AutoCompleteField::new(core)),
            FieldKind::Fake => Self::Fake(FakeField::new(core)),
        })
    }

    #[must_use]
    pub const fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Textarea(_) => FieldKind::Textarea,
            Self::RichText(_) => FieldKind::RichText,
            Self::Select(_) => FieldKind::Select,
            Self::Checkbox(_) => FieldKind::Checkbox,
            Self::Checkboxes(_) => FieldKind::Checkboxes,
            Self::Date(_) => FieldKind::Date,
            Self::DateTime(_) => FieldKind::DateTime,
            Self::Time(_) => FieldKind::Time,
            Self::Tags(_) => FieldKind::Tags,
            Self::Match(_) => FieldKind::Match,
            Self::AutoComplete(_) => FieldKind::AutoComplete,
            Self::Fake(_) => FieldKind::Fake,
        }
    }

    /// Shared part of the field
    #[must_use]
    pub fn core(&self) -> &FieldCore {
        match self {
            Self::Text(f) | Self::Textarea(f) => f.core(),
            Self::RichText(f) => f.core(),
            Self::Select(f) => f.core(),
            Self::Checkbox(f) => f.core(),
            Self::Checkboxes(f) => f.core(),
            Self::Date(f) => f.core(),
            Self::DateTime(f) => f.core(),
            Self::Time(f) => f.core(),
            Self::Tags(f) => f.core(),
            Self::Match(f) => f.core(),
            Self::AutoComplete(f) => f.core(),
            Self::Fake(f) => f.core(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.core().name()
    }

    pub async fn get_element(&self) -> VeoResult<Finder> {
        self.core().get_element().await
    }

    pub async fn get_label(&self) -> VeoResult<String> {
        self.core().get_label().await
    }

    pub async fn get_description(&self) -> VeoResult<String> {
        self.core().get_description().await
    }

    pub async fn get_error_message(&self) -> VeoResult<String> {
        self.core().get_error_message().await
    }

    pub async fn get_text(&self) -> VeoResult<String> {
        self.core().get_text().await
    }

    pub async fn get_value(&self) -> VeoResult<FieldValue> {
        Ok(match self {
            Self::Text(f) | Self::Textarea(f) => f.get_value().await?.into(),
            Self::RichText(f) => f.get_value().await?.into(),
            Self::Select(f) => f.get_value().await?.into(),
            Self::Checkbox(f) => f.get_value().await?.into(),
            Self::Checkboxes(f) => f.get_value().await?.into(),
            Self::Date(f) => f.get_value().await?.into(),
            Self::DateTime(f) => f
                .get_value()
                .await?
                .map_or(FieldValue::None, FieldValue::DateTime),
            Self::Time(f) => f.get_value().await?.into(),
            Self::Tags(f) => f.get_value().await?.into(),
            Self::Match(f) => f.get_value().await?.into(),
            Self::AutoComplete(f) => f.get_value().await?.into(),
            Self::Fake(f) => f.get_value().await?.into(),
        })
    }

    fn invalid(&self, value: &FieldValue, expected: &str) -> VeoError {
        VeoError::InvalidFieldValue {
            name: self.name().to_string(),
            message: format!("expected {expected}, got {}", value.shape()),
        }
    }

    fn text_of<'a>(&self, value: &'a FieldValue) -> VeoResult<&'a str> {
        match value {
            FieldValue::None => Ok(""),
            FieldValue::Text(text) => Ok(text),
            other => Err(self.invalid(other, "a text")),
        }
    }

    fn list_of<'a>(&self, value: &'a FieldValue) -> VeoResult<&'a [String]> {
        match value {
            FieldValue::None => Ok(&[]),
            FieldValue::List(list) => Ok(list),
            other => Err(self.invalid(other, "a list")),
        }
    }

    /// Write `value`; [`FieldValue::None`] clears the field
    pub async fn set_value(&self, value: &FieldValue) -> VeoResult<()> {
        match self {
            Self::Text(f) | Self::Textarea(f) => f.set_value(self.text_of(value)?).await,
            Self::RichText(f) => f.set_value(self.text_of(value)?).await,
            Self::AutoComplete(f) => f.set_value(self.text_of(value)?).await,
            Self::Time(f) => f.set_value(self.text_of(value)?).await,
            Self::Date(f) => f.set_text(self.text_of(value)?).await,
            Self::Select(f) => match self.text_of(value)? {
                "" => f.clear().await,
                text => f.set_value(text).await,
            },
            Self::Checkbox(f) => match value {
                FieldValue::None => f.set_value(false).await,
                FieldValue::Flag(flag) => f.set_value(*flag).await,
                other => Err(self.invalid(other, "a flag")),
            },
            Self::Checkboxes(f) => f.set_value(self.list_of(value)?).await,
            Self::Tags(f) => f.fill(self.list_of(value)?).await,
            Self::Match(f) => match value {
                FieldValue::None => f.clear().await,
                FieldValue::Matches(matches) => f.fill(matches).await,
                other => Err(self.invalid(other, "matches")),
            },
            Self::DateTime(f) => match value {
                FieldValue::None => f.clear().await,
                FieldValue::DateTime(date_time) => f.set_value(*date_time).await,
                other => Err(self.invalid(other, "a date and time")),
            },
            Self::Fake(_) => Ok(()),
        }
    }

    pub async fn clear(&self) -> VeoResult<()> {
        match self {
            Self::Text(f) | Self::Textarea(f) => f.clear().await,
            Self::RichText(f) => f.clear().await,
            Self::Select(f) => f.clear().await,
            Self::Checkbox(f) => f.clear().await,
            Self::Checkboxes(f) => f.clear().await,
            Self::Date(f) => f.clear().await,
            Self::DateTime(f) => f.clear().await,
            Self::Time(f) => f.clear().await,
            Self::Tags(f) => f.clear().await,
            Self::Match(f) => f.clear().await,
            Self::AutoComplete(f) => f.clear().await,
            Self::Fake(_) => Ok(()),
        }
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        match self {
            Self::Text(f) | Self::Textarea(f) => f.is_on_error().await,
            Self::RichText(f) => f.is_on_error().await,
            Self::Select(f) => f.is_on_error().await,
            Self::Checkbox(f) => f.is_on_error().await,
            Self::Checkboxes(f) => f.is_on_error().await,
            Self::Date(f) => f.is_on_error().await,
            Self::DateTime(f) => f.is_on_error().await,
            Self::Time(f) => f.is_on_error().await,
            Self::Tags(f) => f.is_on_error().await,
            Self::Match(f) => f.is_on_error().await,
            Self::AutoComplete(f) => f.is_on_error().await,
            Self::Fake(_) => Ok(false),
        }
    }
}
