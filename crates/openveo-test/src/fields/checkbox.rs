//! Single checkbox and checkbox groups.
//!
//! The state is read from the `checked` attribute of the inputs; clicks only
//! happen when the current state differs from the requested one.

use super::common::{strip_required_marker, FieldCore};
use crate::result::VeoResult;

#[derive(Debug, Clone)]
pub struct CheckboxField {
    core: FieldCore,
}

impl CheckboxField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    pub async fn is_checked(&self) -> VeoResult<bool> {
        let input = self.core.part(".checkbox label input").await?;
        Ok(self.core.session().attribute(&input, "checked").await?.is_some())
    }

    /// Label of the checkbox when checked
    pub async fn get_value(&self) -> VeoResult<Option<String>> {
        if !self.is_checked().await? {
            return Ok(None);
        }
        let label = self.core.part(".checkbox label").await?;
        Ok(Some(self.core.session().text(&label).await?))
    }

    pub async fn set_value(&self, checked: bool) -> VeoResult<()> {
        if self.is_checked().await? != checked {
            let input = self.core.part(".checkbox label input").await?;
            self.core.session().click(&input).await?;
        }
        Ok(())
    }

    pub async fn clear(&self) -> VeoResult<()> {
        self.set_value(false).await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }
}

#[derive(Debug, Clone)]
pub struct CheckboxesField {
    core: FieldCore,
}

impl CheckboxesField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    /// `(label, checked)` of every box, in order
    async fn states(&self) -> VeoResult<Vec<(String, bool)>> {
        let labels = self.core.part(".checkbox label").await?;
        let session = self.core.session();
        let mut states = Vec::new();
        for i in 0..session.count(&labels).await? {
            let label = labels.nth(i as isize);
            let checked = session.attribute(&label.find_css("input"), "checked").await?.is_some();
            let text = strip_required_marker(&session.text(&label).await?);
            states.push((text, checked));
        }
        Ok(states)
    }

    /// Labels of the checked boxes
    pub async fn get_value(&self) -> VeoResult<Vec<String>> {
        Ok(self
            .states()
            .await?
            .into_iter()
            .filter_map(|(text, checked)| checked.then_some(text))
            .collect())
    }

    /// Check exactly the boxes labelled in `values`
    pub async fn set_value(&self, values: &[String]) -> VeoResult<()> {
        let labels = self.core.part(".checkbox label").await?;
        for (i, (text, checked)) in self.states().await?.into_iter().enumerate() {
            if checked != values.contains(&text) {
                self.core.session().click(&labels.nth(i as isize)).await?;
            }
        }
        Ok(())
    }

    pub async fn clear(&self) -> VeoResult<()> {
        self.set_value(&[]).await
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }
}
