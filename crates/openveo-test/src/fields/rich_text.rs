//! TinyMCE editor.
//!
//! The editor lives in an iframe, so its content goes through the TinyMCE API
//! of the page instead of the DOM. Only the active editor is reachable.

use super::common::FieldCore;
use crate::driver::ScriptArg;
use crate::result::VeoResult;
use crate::scripts;
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RichTextField {
    core: FieldCore,
}

impl RichTextField {
    #[must_use]
    pub fn new(core: FieldCore) -> Self {
        Self { core }
    }

    #[must_use]
    pub fn core(&self) -> &FieldCore {
        &self.core
    }

    /// HTML content of the active editor
    pub async fn get_value(&self) -> VeoResult<String> {
        let content = self
            .core
            .session()
            .execute_script(scripts::TINYMCE_GET_CONTENT, Vec::new())
            .await?;
        Ok(match content {
            Value::String(html) => html,
            Value::Null => String::new(),
            other => other.to_string(),
        })
    }

    /// Replace the content; an empty value clears the editor
    pub async fn set_value(&self, value: &str) -> VeoResult<()> {
        self.clear().await?;
        if value.is_empty() {
            return Ok(());
        }
        self.insert_value(value).await
    }

    /// Insert `html` at the caret, keeping the current content
    pub async fn insert_value(&self, html: &str) -> VeoResult<()> {
        self.core
            .session()
            .execute_script(scripts::TINYMCE_INSERT_CONTENT, vec![ScriptArg::Value(html.into())])
            .await
            .map(|_| ())
    }

    pub async fn clear(&self) -> VeoResult<()> {
        self.core
            .session()
            .execute_script(scripts::TINYMCE_SET_CONTENT, vec![ScriptArg::Value("".into())])
            .await
            .map(|_| ())
    }

    pub async fn is_on_error(&self) -> VeoResult<bool> {
        self.core.has_error_class().await
    }
}
