//! Single line, multi line and auto-completed text inputs.

use super::common::FieldCore;
use crate::result::{VeoError, VeoResult};
use crate::wait::{self, Expectation};

/// Text input (`input`) or text area (`textarea`)
#[derive(Debug, Clone)]
pub struct TextField {
    core: FieldCore,
    tag: &'static str,
}

impl TextField {
    /// Single line input
    #[must_use]
    pub fn input(core: FieldCore) -> Self {
        Self { core, tag: "input" }
    }

    /// Multi line text area
    #[must_use]
    pub fn textarea(core: FieldCore) -> Self {
        Self { core, tag: "textarea" }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    pub async fn get_value(&self) -> VeoResult<String> {
        let input = self.core.part(self.tag).await?;
        Ok(self.core.session().attribute(&input, "value").await?.unwrap_or_default())
    }

    /// Replace the text; an empty value clears the input
    pub async fn set_value(&self, value: &str) -> VeoResult<()> {
        if value.is_empty() {
            return self.clear().await;
        }
        let input = self.core.part(self.tag).await?;
        self.core.session().clear(&input).await?;
        self.core.session().send_keys(&input, value).await
    }

    pub async fn clear(&self) -> VeoResult<()> {
        let input = self.core.part(self.tag).await?;
        self.core.session().clear(&input).await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_visible_error().await
    }
}

/// Text input proposing suggestions while typing
#[derive(Debug, Clone)]
pub struct AutoCompleteField {
    text: TextField,
}

impl AutoCompleteField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self {
            text: TextField::input(core),
        }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        self.text.core()
    }

    pub async fn get_value(&self) -> VeoResult<String> {
        self.text.get_value().await
    }

    pub async fn set_value(&self, value: &str) -> VeoResult<()> {
        self.text.set_value(value).await
    }

    pub async fn clear(&self) -> VeoResult<()> {
        self.text.clear().await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.text.is_on_error().await
    }

    /// Suggestions currently proposed
    pub async fn get_suggestions(&self) -> VeoResult<Vec<String>> {
        let suggestions = self.core().part("li > div").await?;
        self.core().session().texts(&suggestions).await
    }

    /// Click the suggestion reading exactly `suggestion`
    pub async fn validate_suggestion(&self, suggestion: &str) -> VeoResult<()> {
        let suggestions = self.core().part("li > div").await?;
        let texts = self.core().session().texts(&suggestions).await?;
        let index = texts
            .iter()
            .position(|text| text == suggestion)
            .ok_or_else(|| VeoError::SuggestionNotFound {
                value: suggestion.to_string(),
            })?;
        self.core().session().click(&suggestions.nth(index as isize)).await
    }

    /// Type `value` then pick the suggestion reading `suggestion`
    pub async fn set_value_with_suggestion(&self, value: &str, suggestion: &str) -> VeoResult<()> {
        self.set_value(value).await?;
        let session = self.core().session();
        let suggestions = self.core().part("li > div").await?.first();
        // A missing list ends up as SuggestionNotFound below
        let outcome = session
            .wait(Expectation::Visible(suggestions), session.short_wait(), "Missing suggestions")
            .await;
        wait::held(outcome)?;
        self.validate_suggestion(suggestion).await
    }
}
