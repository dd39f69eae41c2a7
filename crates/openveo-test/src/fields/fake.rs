//! Read-only field showing a static text.

use super::common::FieldCore;
use crate::result::VeoResult;

#[derive(Debug, Clone)]
pub struct FakeField {
    core: FieldCore,
}

impl FakeField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    pub async fn get_value(&self) -> VeoResult<String> {
        self.core.get_text().await
    }
}
