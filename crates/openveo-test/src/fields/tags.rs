//! Tag list typed one entry at a time.
//!
//! Tags are entered by typing them followed by ENTER. In auto-completion mode
//! each tag has to be picked from the suggestions proposed while typing.

use super::common::FieldCore;
use crate::driver::keys;
use crate::locator::Finder;
use crate::result::{VeoError, VeoResult};
use crate::wait::{self, Expectation};

#[derive(Debug, Clone)]
pub struct TagsField {
    core: FieldCore,
    available_options: Vec<String>,
}

impl TagsField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self {
            core,
            available_options: Vec::new(),
        }
    }

    /// Restrict auto-completion to these options
    #[must_use]
    pub fn with_available_options(mut self, options: Vec<String>) -> Self {
        self.available_options = options;
        self
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    #[must_use]
    pub fn available_options(&self) -> &[String] {
        &self.available_options
    }

    /// Tags are picked among suggestions when options are known
    #[must_use]
    pub fn uses_auto_completion(&self) -> bool {
        !self.available_options.is_empty()
    }

    /// Replace the tags the way the field expects them to be entered
    pub async fn fill(&self, values: &[String]) -> VeoResult<()> {
        if self.uses_auto_completion() {
            self.set_value_using_auto_completion(values).await
        } else {
            self.set_value(values).await
        }
    }

    /// Texts of the displayed tags
    pub async fn get_value(&self) -> VeoResult<Vec<String>> {
        let items = self.core.part("li").await?;
        let session = self.core.session();
        let mut tags = Vec::new();
        for i in 0..session.count(&items).await? {
            let item = items.nth(i as isize);
            if session.is_visible(&item).await? {
                tags.push(session.text(&item).await?);
            }
        }
        Ok(tags)
    }

    /// Replace the tags, typing each one followed by ENTER
    pub async fn set_value(&self, values: &[String]) -> VeoResult<()> {
        self.clear().await?;
        if values.is_empty() {
            return Ok(());
        }
        let session = self.core.session();
        let input = self.core.part("input").await?;
        session.clear(&input).await?;
        for value in values {
            session.send_keys(&input, &format!("{value}{}", keys::ENTER)).await?;
            session.clear(&input).await?;
        }
        Ok(())
    }

    /// Replace the tags, picking each one among the suggestions
    pub async fn set_value_using_auto_completion(&self, values: &[String]) -> VeoResult<()> {
        self.clear().await?;
        let session = self.core.session();
        let input = self.core.part("input").await?;
        for value in values {
            if !self.available_options.is_empty() && !self.available_options.contains(value) {
                return Err(VeoError::SuggestionNotFound { value: value.clone() });
            }
            session.clear(&input).await?;
            session.send_keys(&input, value).await?;
            self.pick_suggestion(value).await?;
        }
        Ok(())
    }

    async fn pick_suggestion(&self, value: &str) -> VeoResult<()> {
        let session = self.core.session();
        let suggestions = self.core.part("li > div").await?;
        // A list that never shows up ends up as SuggestionNotFound below
        let outcome = session
            .wait(
                Expectation::Visible(suggestions.first()),
                session.short_wait(),
                "Missing suggestions",
            )
            .await;
        wait::held(outcome)?;
        let texts = session.texts(&suggestions).await?;
        let index = texts
            .iter()
            .position(|text| text == value)
            .ok_or_else(|| VeoError::SuggestionNotFound {
                value: value.to_string(),
            })?;
        session.click(&suggestions.nth(index as isize)).await
    }

    /// Click every remove link
    pub async fn clear(&self) -> VeoResult<()> {
        let links = self.core.part("a").await?;
        remove_all(&self.core, &links).await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_visible_error().await
    }
}

/// Click the first of `links` until none is left, at most as many times as
/// there were links to begin with
pub(super) async fn remove_all(core: &FieldCore, links: &Finder) -> VeoResult<()> {
    let session = core.session();
    let first = links.first();
    for _ in 0..session.count(links).await? {
        if !session.is_present(&first).await? {
            break;
        }
        session.click(&first).await?;
    }
    Ok(())
}
