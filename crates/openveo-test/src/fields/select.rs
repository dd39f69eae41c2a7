//! Drop-down list.

use super::common::FieldCore;
use crate::result::{VeoError, VeoResult};

#[derive(Debug, Clone)]
pub struct SelectField {
    core: FieldCore,
}

impl SelectField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    /// Texts of every option
    pub async fn get_options(&self) -> VeoResult<Vec<String>> {
        let options = self.core.part("option").await?;
        self.core.session().texts(&options).await
    }

    /// Text of the selected option
    pub async fn get_value(&self) -> VeoResult<Option<String>> {
        let selected = self.core.part("option[selected]").await?.first();
        if !self.core.session().is_present(&selected).await? {
            return Ok(None);
        }
        let text = self.core.session().text(&selected).await?;
        Ok((!text.is_empty()).then_some(text))
    }

    /// Select the option reading `value`; an empty value clears
    pub async fn set_value(&self, value: &str) -> VeoResult<()> {
        let options = self.core.part("option").await?;
        let texts = self.core.session().texts(&options).await?;
        let index = texts
            .iter()
            .position(|text| text == value)
            .ok_or_else(|| VeoError::InvalidFieldValue {
                name: self.core.name().to_string(),
                message: format!("no option \"{value}\""),
            })?;
        self.core.session().click(&options.nth(index as isize)).await
    }

    /// Select the first option
    pub async fn clear(&self) -> VeoResult<()> {
        let first = self.core.part("option").await?.first();
        if self.core.session().is_present(&first).await? {
            self.core.session().click(&first).await?;
        }
        Ok(())
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }
}
