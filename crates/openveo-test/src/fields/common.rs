//! Operations shared by every field.

use crate::locator::{Finder, Locator};
use crate::result::{VeoError, VeoResult};
use crate::session::Session;
use regex::Regex;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn label_suffix() -> &'static Regex {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    SUFFIX.get_or_init(|| Regex::new(r" ?[*:]?$").expect("label suffix pattern is valid"))
}

#[allow(clippy::expect_used)]
fn required_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| Regex::new(r" ?\*?$").expect("required marker pattern is valid"))
}

/// Label text without its trailing required marker (`*`) or colon
#[must_use]
pub fn normalize_label(text: &str) -> String {
    label_suffix().replace(text, "").into_owned()
}

/// Option label without its trailing required marker
#[must_use]
pub fn strip_required_marker(text: &str) -> String {
    required_marker().replace(text, "").into_owned()
}

/// Name, scope and session of a field
#[derive(Debug, Clone)]
pub struct FieldCore {
    session: Session,
    name: String,
    base: Finder,
    anchor: Option<Finder>,
}

impl FieldCore {
    /// Field labelled `name` inside `base`
    pub fn new(session: Session, name: impl Into<String>, base: Finder) -> VeoResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(VeoError::MissingFieldName);
        }
        Ok(Self {
            session,
            name,
            base,
            anchor: None,
        })
    }

    /// Field whose container is known, skipping the label lookup
    #[must_use]
    pub fn anchored(session: Session, name: impl Into<String>, element: Finder) -> Self {
        Self {
            session,
            name: name.into(),
            base: element.clone(),
            anchor: Some(element),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn base(&self) -> &Finder {
        &self.base
    }

    /// Container of the field: parent of the last label whose text matches the name
    pub async fn get_element(&self) -> VeoResult<Finder> {
        if let Some(anchor) = &self.anchor {
            return Ok(anchor.clone());
        }
        let labels = self.base.find_css("label");
        let texts = self
            .session
            .texts(&labels)
            .await
            .map_err(|e| VeoError::FieldNotFound {
                name: self.name.clone(),
                cause: Some(e.to_string()),
            })?;
        let index = texts
            .iter()
            .rposition(|text| normalize_label(text) == self.name)
            .ok_or_else(|| VeoError::FieldNotFound {
                name: self.name.clone(),
                cause: None,
            })?;
        Ok(labels.nth(index as isize).parent())
    }

    /// Element inside the container
    pub async fn part(&self, selector: &str) -> VeoResult<Finder> {
        Ok(self.get_element().await?.find_css(selector))
    }

    /// Own label text, normalized
    pub async fn get_label(&self) -> VeoResult<String> {
        let label = self.get_element().await?.find(Locator::xpath("./label"));
        Ok(normalize_label(&self.session.text(&label).await?))
    }

    /// Help text under the field
    pub async fn get_description(&self) -> VeoResult<String> {
        let description = self.part("p").await?;
        self.session.text(&description).await
    }

    /// Validation message, empty when the field shows none
    pub async fn get_error_message(&self) -> VeoResult<String> {
        let error = self.get_element().await?.find(Locator::binding("$error")).first();
        if self.session.is_present(&error).await? {
            self.session.text(&error).await
        } else {
            Ok(String::new())
        }
    }

    /// Static text of the field
    pub async fn get_text(&self) -> VeoResult<String> {
        let text = self.part("div > div").await?.first();
        self.session.text(&text).await
    }

    /// Whether a visible `.has-error` block sits inside the container
    pub async fn has_visible_error(&self) -> VeoResult<bool> {
        let error = self.part(".has-error").await?;
        self.session.is_visible(&error).await
    }

    /// Whether the container itself carries the `has-error` class
    pub async fn has_error_class(&self) -> VeoResult<bool> {
        let element = self.get_element().await?;
        self.session.has_class(&element, "has-error").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    mod normalize_tests {
        use super::*;

        #[test]
        fn test_markers_stripped() {
            assert_eq!(normalize_label("Title *"), "Title");
            assert_eq!(normalize_label("Title*"), "Title");
            assert_eq!(normalize_label("Title:"), "Title");
            assert_eq!(normalize_label("Title :"), "Title");
            assert_eq!(normalize_label("Title "), "Title");
            assert_eq!(normalize_label("Title"), "Title");
            assert_eq!(normalize_label("A * b"), "A * b");
        }

        #[test]
        fn test_required_marker_keeps_colon() {
            assert_eq!(strip_required_marker("Local *"), "Local");
            assert_eq!(strip_required_marker("Local:"), "Local:");
        }

        proptest! {
            #[test]
            fn prop_marked_label_normalizes_to_name(
                name in "[A-Za-z][A-Za-z ]{0,15}[A-Za-z]",
                marker in prop::sample::select(vec!["", " *", "*", ":", " :"])
            ) {
                let label = format!("{name}{marker}");
                prop_assert_eq!(normalize_label(&label), name);
            }
        }
    }
}
