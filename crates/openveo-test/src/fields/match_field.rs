//! List of text/tags pairs.
//!
//! Each match is a text input associated with a tag list. Matches are added
//! with the add button and removed with the remove icon of each match.

use super::common::FieldCore;
use super::tags::{remove_all, TagsField};
use super::text::TextField;
use crate::locator::{Finder, Locator};
use crate::result::VeoResult;
use serde::{Deserialize, Serialize};

/// One match
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MatchValue {
    pub text: String,
    pub tags: Vec<String>,
}

impl MatchValue {
    #[must_use]
    pub fn new<I, S>(text: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: text.into(),
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchField {
    core: FieldCore,
    available_options: Vec<String>,
}

impl MatchField {
    const MATCHES: &'static str = "match in matches";

    #[must_use]
    pub fn new(core: FieldCore, available_options: Vec<String>) -> Self {
        Self {
            core,
            available_options,
        }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    /// Replace every match, picking tags among suggestions when options are known
    pub async fn fill(&self, values: &[MatchValue]) -> VeoResult<()> {
        if self.available_options.is_empty() {
            self.set_value(values).await
        } else {
            self.set_value_using_auto_completion(values).await
        }
    }

    async fn matches(&self) -> VeoResult<Finder> {
        Ok(self.core.get_element().await?.find(Locator::repeater(Self::MATCHES)))
    }

    fn text_field(&self, item: &Finder) -> TextField {
        let wrapper = item.find_css("input").first().parent();
        TextField::input(FieldCore::anchored(
            self.core.session().clone(),
            self.core.name(),
            wrapper,
        ))
    }

    fn tags_field(&self, item: &Finder) -> TagsField {
        let tags = item.find_css(".ov-field-tags");
        TagsField::new(FieldCore::anchored(self.core.session().clone(), self.core.name(), tags))
            .with_available_options(self.available_options.clone())
    }

    pub async fn get_value(&self) -> VeoResult<Vec<MatchValue>> {
        let matches = self.matches().await?;
        let mut values = Vec::new();
        for i in 0..self.core.session().count(&matches).await? {
            let item = matches.nth(i as isize);
            values.push(MatchValue {
                text: self.text_field(&item).get_value().await?,
                tags: self.tags_field(&item).get_value().await?,
            });
        }
        Ok(values)
    }

    /// Replace every match
    pub async fn set_value(&self, values: &[MatchValue]) -> VeoResult<()> {
        self.clear().await?;
        for value in values {
            let item = self.add_match().await?;
            self.text_field(&item).set_value(&value.text).await?;
            self.tags_field(&item).set_value(&value.tags).await?;
        }
        Ok(())
    }

    /// Replace every match, picking tags among the suggestions
    pub async fn set_value_using_auto_completion(&self, values: &[MatchValue]) -> VeoResult<()> {
        self.clear().await?;
        for value in values {
            let item = self.add_match().await?;
            self.text_field(&item).set_value(&value.text).await?;
            self.tags_field(&item)
                .set_value_using_auto_completion(&value.tags)
                .await?;
        }
        Ok(())
    }

    async fn add_match(&self) -> VeoResult<Finder> {
        let button = self.core.part(".ov-field-match-add-button").await?;
        self.core.session().click(&button).await?;
        Ok(self.matches().await?.last())
    }

    /// Remove every match
    pub async fn clear(&self) -> VeoResult<()> {
        let icons = self.matches().await?.find_css(".ov-field-match-remove-icon");
        remove_all(&self.core, &icons).await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }

    /// Label of the add button
    pub async fn get_add_label(&self) -> VeoResult<String> {
        let label = self.core.part(".ov-field-match-add-label").await?;
        self.core.session().text(&label).await
    }

    /// Placeholder of the text input
    pub async fn get_input_placeholder(&self) -> VeoResult<Option<String>> {
        let input = self.core.part("input").await?.nth(0);
        self.core.session().attribute(&input, "placeholder").await
    }

    /// Placeholder of the tags input
    pub async fn get_tags_placeholder(&self) -> VeoResult<Option<String>> {
        let input = self.core.part("input").await?.nth(1);
        self.core.session().attribute(&input, "placeholder").await
    }
}
