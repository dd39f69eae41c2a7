//! Translation dictionaries.
//!
//! Dictionaries are JSON trees keyed by dictionary name and language code.
//! Page objects use them to resolve labels ("UI.REMOVE") before matching them
//! against the page.

use crate::result::{VeoError, VeoResult};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Dictionary of the back office user interface
pub const BACK_OFFICE_DICTIONARY: &str = "admin-back-office";

/// Dictionary shared by every interface
pub const COMMON_DICTIONARY: &str = "common";

/// Tree of translations
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Translations(Value);

impl Translations {
    /// Wrap a JSON tree
    #[must_use]
    pub fn new(tree: Value) -> Self {
        Self(tree)
    }

    /// Empty dictionary
    #[must_use]
    pub fn empty() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Raw tree
    #[must_use]
    pub fn tree(&self) -> &Value {
        &self.0
    }

    /// Text at a dotted path (`"UI.REMOVE"`)
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        key.split('.')
            .try_fold(&self.0, |node, part| node.get(part))
            .and_then(Value::as_str)
    }

    /// Text at a dotted path, or the key itself when missing
    #[must_use]
    pub fn translate(&self, key: &str) -> String {
        self.get(key).unwrap_or(key).to_string()
    }

    /// Deep merge `other` into `self`, `other` winning on conflicts
    pub fn merge(&mut self, other: &Self) {
        merge_values(&mut self.0, &other.0);
    }
}

fn merge_values(target: &mut Value, source: &Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, source) => *target = source.clone(),
    }
}

/// Provider of dictionaries
#[async_trait]
pub trait TranslationSource: Send + Sync {
    /// Dictionary `dictionary` for `language` (e.g. `"en"`)
    async fn get_translations(&self, dictionary: &str, language: &str) -> VeoResult<Translations>;

    /// Back office dictionary merged with the common one
    async fn back_end_translations(&self, language: &str) -> VeoResult<Translations> {
        let mut translations = self.get_translations(BACK_OFFICE_DICTIONARY, language).await?;
        let common = self.get_translations(COMMON_DICTIONARY, language).await?;
        translations.merge(&common);
        Ok(translations)
    }
}

/// Dictionaries read from `<directory>/<dictionary>-<language>.json`
#[derive(Debug, Clone)]
pub struct DirectoryTranslations {
    directory: PathBuf,
}

impl DirectoryTranslations {
    /// Source reading from `directory`
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl TranslationSource for DirectoryTranslations {
    async fn get_translations(&self, dictionary: &str, language: &str) -> VeoResult<Translations> {
        let path = self.directory.join(format!("{dictionary}-{language}.json"));
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| VeoError::Translation {
                message: format!("{}: {e}", path.display()),
            })?;
        Ok(Translations::new(serde_json::from_str(&content)?))
    }
}

/// Dictionaries held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryTranslations {
    dictionaries: BTreeMap<(String, String), Translations>,
}

impl MemoryTranslations {
    /// Empty source
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dictionary
    #[must_use]
    pub fn with(mut self, dictionary: &str, language: &str, tree: Value) -> Self {
        self.dictionaries
            .insert((dictionary.to_string(), language.to_string()), Translations::new(tree));
        self
    }
}

#[async_trait]
impl TranslationSource for MemoryTranslations {
    async fn get_translations(&self, dictionary: &str, language: &str) -> VeoResult<Translations> {
        self.dictionaries
            .get(&(dictionary.to_string(), language.to_string()))
            .cloned()
            .ok_or_else(|| VeoError::Translation {
                message: format!("no dictionary {dictionary} for language {language}"),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_dotted_lookup_and_fallback() {
            let t = Translations::new(json!({"UI": {"REMOVE": "Remove", "COUNT": 3}}));
            assert_eq!(t.get("UI.REMOVE"), Some("Remove"));
            assert_eq!(t.get("UI.COUNT"), None);
            assert_eq!(t.translate("UI.MISSING"), "UI.MISSING");
            assert_eq!(t.translate("UI.REMOVE"), "Remove");
        }

        #[test]
        fn test_merge_right_wins() {
            let mut left = Translations::new(json!({"UI": {"REMOVE": "Remove", "ADD": "Add"}}));
            let right = Translations::new(json!({
                "UI": {"REMOVE": "Delete"},
                "MENU": {"HOME": "Home"}
            }));
            left.merge(&right);
            assert_eq!(left.get("UI.REMOVE"), Some("Delete"));
            assert_eq!(left.get("UI.ADD"), Some("Add"));
            assert_eq!(left.get("MENU.HOME"), Some("Home"));
        }
    }

    mod source_tests {
        use super::*;

        #[tokio::test]
        async fn test_back_end_translations_merge_common() {
            let source = MemoryTranslations::new()
                .with(BACK_OFFICE_DICTIONARY, "fr", json!({"LOGIN": {"SUBMIT": "Se connecter"}}))
                .with(COMMON_DICTIONARY, "fr", json!({"UI": {"REMOVE": "Supprimer"}}));
            let t = source.back_end_translations("fr").await.unwrap();
            assert_eq!(t.get("LOGIN.SUBMIT"), Some("Se connecter"));
            assert_eq!(t.get("UI.REMOVE"), Some("Supprimer"));
            assert!(source.back_end_translations("de").await.is_err());
        }

        #[tokio::test]
        async fn test_directory_source() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(
                dir.path().join("common-en.json"),
                r#"{"UI": {"REMOVE": "Remove"}}"#,
            )
            .unwrap();
            let source = DirectoryTranslations::new(dir.path());
            let t = source.get_translations("common", "en").await.unwrap();
            assert_eq!(t.get("UI.REMOVE"), Some("Remove"));
            let err = source.get_translations("common", "fr").await.unwrap_err();
            assert!(matches!(err, VeoError::Translation { .. }));
        }
    }
}
