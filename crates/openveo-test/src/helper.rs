//! Fixture helpers.
//!
//! A [`Helper`] creates and removes entities straight in the backing store,
//! without going through the back office, so tests can set up their data
//! quickly. Store calls are scheduled on the session [`ControlFlow`] after
//! AngularJS settles, which keeps them ordered with the browser actions of the
//! same test.
//!
//! [`ControlFlow`]: crate::flow::ControlFlow

use crate::i18n::Translations;
use crate::result::{VeoError, VeoResult};
use crate::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

/// Filter on entity properties, every pair must match
pub type EntityFilter = Map<String, Value>;

/// Entity persisted in the backing store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Store assigned id
    pub id: String,
    /// Other properties
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Entity {
    /// Property value
    #[must_use]
    pub fn get(&self, property: &str) -> Option<&Value> {
        self.fields.get(property)
    }

    /// `name` property, empty when missing
    #[must_use]
    pub fn name(&self) -> &str {
        self.get("name").and_then(Value::as_str).unwrap_or("")
    }

    /// Whether every property of `filter` equals the entity's
    #[must_use]
    pub fn matches(&self, filter: &EntityFilter) -> bool {
        filter.iter().all(|(key, expected)| match key.as_str() {
            "id" => expected.as_str() == Some(self.id.as_str()),
            _ => self.fields.get(key) == Some(expected),
        })
    }
}

/// Add/remove/get contract of the backing store
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Persist a batch of entities, returning them with their ids
    async fn add(&self, entities: Vec<Value>) -> VeoResult<Vec<Entity>>;

    /// Remove entities by id, returning the number removed
    async fn remove(&self, ids: Vec<String>) -> VeoResult<usize>;

    /// Entities matching `filter`, all of them without filter
    async fn get(&self, filter: Option<&EntityFilter>) -> VeoResult<Vec<Entity>>;
}

/// Store kept in memory, cloned handles share the same entities
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entities: Arc<Mutex<Vec<Entity>>>,
}

impl MemoryStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> VeoResult<MutexGuard<'_, Vec<Entity>>> {
        self.entities.lock().map_err(|_| VeoError::Store {
            message: "memory store poisoned".to_string(),
        })
    }

    /// Persist one entity, keeping its `id` when it carries one
    pub fn insert(&self, entity: Value) -> VeoResult<Entity> {
        let Value::Object(mut fields) = entity else {
            return Err(VeoError::Store {
                message: format!("entity must be an object, got {entity}"),
            });
        };
        let id = match fields.remove("id") {
            Some(Value::String(id)) => id,
            _ => uuid::Uuid::new_v4().to_string(),
        };
        let entity = Entity { id, fields };
        self.lock()?.push(entity.clone());
        Ok(entity)
    }

    /// Remove entities by id
    pub fn delete(&self, ids: &[String]) -> VeoResult<usize> {
        let ids: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let mut entities = self.lock()?;
        let before = entities.len();
        entities.retain(|e| !ids.contains(e.id.as_str()));
        Ok(before - entities.len())
    }

    /// Snapshot of every entity, in insertion order
    pub fn entities(&self) -> VeoResult<Vec<Entity>> {
        Ok(self.lock()?.clone())
    }

    /// Number of entities
    pub fn len(&self) -> VeoResult<usize> {
        Ok(self.lock()?.len())
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> VeoResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn add(&self, entities: Vec<Value>) -> VeoResult<Vec<Entity>> {
        entities.into_iter().map(|e| self.insert(e)).collect()
    }

    async fn remove(&self, ids: Vec<String>) -> VeoResult<usize> {
        self.delete(&ids)
    }

    async fn get(&self, filter: Option<&EntityFilter>) -> VeoResult<Vec<Entity>> {
        let entities = self.entities()?;
        Ok(match filter {
            Some(filter) => entities.into_iter().filter(|e| e.matches(filter)).collect(),
            None => entities,
        })
    }
}

/// Store failing every call, to exercise error paths
#[derive(Debug, Clone)]
pub struct FailingStore {
    message: String,
}

impl FailingStore {
    /// Store failing with `message`
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    fn fail<T>(&self) -> VeoResult<T> {
        Err(VeoError::Store {
            message: self.message.clone(),
        })
    }
}

impl Default for FailingStore {
    fn default() -> Self {
        Self::new("Database failure")
    }
}

#[async_trait]
impl EntityStore for FailingStore {
    async fn add(&self, _entities: Vec<Value>) -> VeoResult<Vec<Entity>> {
        self.fail()
    }

    async fn remove(&self, _ids: Vec<String>) -> VeoResult<usize> {
        self.fail()
    }

    async fn get(&self, _filter: Option<&EntityFilter>) -> VeoResult<Vec<Entity>> {
        self.fail()
    }
}

/// Sample entities a concrete helper provides for generic CRUD tests
pub trait FixtureExamples: Send + Sync {
    /// Entity to add
    fn add_example(&self) -> VeoResult<Value> {
        Err(VeoError::not_implemented("getAddExample"))
    }

    /// Entity to update
    fn update_example(&self) -> VeoResult<Value> {
        Err(VeoError::not_implemented("getUpdateExample"))
    }

    /// Entity as expected back from the store once validated
    fn validation_example(&self, entity: Value) -> Value {
        entity
    }
}

/// Helper without examples
#[derive(Debug, Clone, Copy, Default)]
pub struct NoExamples;

impl FixtureExamples for NoExamples {}

/// Fixture helper bound to one store and one session
#[derive(Clone)]
pub struct Helper {
    store: Arc<dyn EntityStore>,
    session: Session,
    examples: Arc<dyn FixtureExamples>,
    text_search_properties: Vec<String>,
    sort_properties: Vec<String>,
}

impl std::fmt::Debug for Helper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Helper")
            .field("text_search_properties", &self.text_search_properties)
            .field("sort_properties", &self.sort_properties)
            .finish_non_exhaustive()
    }
}

impl Helper {
    /// Helper over `store`, scheduling on `session`'s queue
    #[must_use]
    pub fn new(store: Arc<dyn EntityStore>, session: Session) -> Self {
        Self {
            store,
            session,
            examples: Arc::new(NoExamples),
            text_search_properties: Vec::new(),
            sort_properties: Vec::new(),
        }
    }

    /// Provide add/update examples
    #[must_use]
    pub fn with_examples(mut self, examples: Arc<dyn FixtureExamples>) -> Self {
        self.examples = examples;
        self
    }

    /// Properties covered by the text search
    #[must_use]
    pub fn with_text_search_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.text_search_properties = properties.into_iter().map(Into::into).collect();
        self
    }

    /// Properties the store can sort on
    #[must_use]
    pub fn with_sort_properties<I, S>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sort_properties = properties.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn text_search_properties(&self) -> &[String] {
        &self.text_search_properties
    }

    #[must_use]
    pub fn sort_properties(&self) -> &[String] {
        &self.sort_properties
    }

    /// Persist `entities` in one store call
    pub async fn add_entities(&self, entities: Vec<Value>) -> VeoResult<Vec<Entity>> {
        self.session.wait_for_angular().await?;
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        info!(count = entities.len(), "adding fixture entities");
        self.session.flow().execute(self.store.add(entities)).await
    }

    /// Persist entities named `"<name> <i>"` for `i` in `offset..total`
    pub async fn add_entities_auto(
        &self,
        name: &str,
        total: usize,
        offset: usize,
    ) -> VeoResult<Vec<Entity>> {
        let entities = (offset..total)
            .map(|i| serde_json::json!({ "name": format!("{name} {i}") }))
            .collect();
        self.add_entities(entities).await
    }

    /// Remove `entities` in one store call, nothing to do when empty
    pub async fn remove_entities(&self, entities: &[Entity]) -> VeoResult<()> {
        self.session.wait_for_angular().await?;
        let ids: Vec<String> = entities.iter().map(|e| e.id.clone()).collect();
        if ids.is_empty() {
            return Ok(());
        }
        let removed = self.session.flow().execute(self.store.remove(ids)).await?;
        debug!(removed, "removed fixture entities");
        Ok(())
    }

    /// Entities matching `filter`
    pub async fn get_entities(&self, filter: Option<&EntityFilter>) -> VeoResult<Vec<Entity>> {
        self.session.wait_for_angular().await?;
        self.session.flow().execute(self.store.get(filter)).await
    }

    /// Remove every entity except `safe` ones
    pub async fn remove_all_entities(&self, safe: &[Entity]) -> VeoResult<()> {
        self.session.wait_for_angular().await?;
        let safe: HashSet<&str> = safe.iter().map(|e| e.id.as_str()).collect();
        self.session
            .flow()
            .execute(async {
                let ids: Vec<String> = self
                    .store
                    .get(None)
                    .await?
                    .into_iter()
                    .filter(|e| !safe.contains(e.id.as_str()))
                    .map(|e| e.id)
                    .collect();
                if !ids.is_empty() {
                    self.store.remove(ids).await?;
                }
                Ok(())
            })
            .await
    }

    /// Translation of `key` in `dictionary`, the key itself when missing
    #[must_use]
    pub fn translate(&self, key: &str, dictionary: &Translations) -> String {
        dictionary.translate(key)
    }

    pub fn get_add_example(&self) -> VeoResult<Value> {
        self.examples.add_example()
    }

    pub fn get_update_example(&self) -> VeoResult<Value> {
        self.examples.update_example()
    }

    pub fn get_validation_example(&self, entity: Value) -> Value {
        self.examples.validation_example(entity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::TestConfig;
    use crate::mock::{El, MockBrowser, StaticApp};
    use serde_json::json;

    fn helper(store: Arc<dyn EntityStore>) -> (Helper, Arc<MockBrowser<StaticApp>>) {
        let browser = Arc::new(MockBrowser::new(
            "http://localhost/",
            StaticApp::new("be/", El::new("body")),
        ));
        let session = Session::new(browser.clone(), TestConfig::new("http://localhost/"));
        (Helper::new(store, session), browser)
    }

    mod memory_store_tests {
        use super::*;

        #[tokio::test]
        async fn test_add_assigns_ids_and_keeps_given_ones() {
            let store = MemoryStore::new();
            let added = store
                .add(vec![json!({"name": "a"}), json!({"id": "42", "name": "b"})])
                .await
                .unwrap();
            assert_eq!(added.len(), 2);
            assert!(!added[0].id.is_empty());
            assert_eq!(added[1].id, "42");
            assert_eq!(added[1].name(), "b");
        }

        #[tokio::test]
        async fn test_non_object_rejected() {
            let store = MemoryStore::new();
            let err = store.add(vec![json!("plain")]).await.unwrap_err();
            assert!(matches!(err, VeoError::Store { .. }));
        }

        #[tokio::test]
        async fn test_filter_and_remove() {
            let store = MemoryStore::new();
            store
                .add(vec![json!({"name": "a", "kind": 1}), json!({"name": "b", "kind": 2})])
                .await
                .unwrap();
            let mut filter = EntityFilter::new();
            filter.insert("kind".to_string(), json!(2));
            let found = store.get(Some(&filter)).await.unwrap();
            assert_eq!(found.len(), 1);
            assert_eq!(found[0].name(), "b");
            assert_eq!(store.remove(vec![found[0].id.clone(), "nope".into()]).await.unwrap(), 1);
            assert_eq!(store.len().unwrap(), 1);
        }
    }

    mod helper_tests {
        use super::*;

        #[tokio::test]
        async fn test_round_trip_leaves_store_unchanged() {
            let store = MemoryStore::new();
            store.insert(json!({"name": "keep"})).unwrap();
            let (helper, browser) = helper(Arc::new(store.clone()));
            let added = helper
                .add_entities(vec![json!({"name": "A 0"}), json!({"name": "A 1"})])
                .await
                .unwrap();
            assert_eq!(store.len().unwrap(), 3);
            helper.remove_entities(&added).await.unwrap();
            let left = store.entities().unwrap();
            assert_eq!(left.len(), 1);
            assert_eq!(left[0].name(), "keep");
            assert!(browser.call_count("wait_for_angular") >= 2);
        }

        #[tokio::test]
        async fn test_auto_names_follow_offset() {
            let store = MemoryStore::new();
            let (helper, _) = helper(Arc::new(store.clone()));
            let added = helper.add_entities_auto("test pagination", 4, 1).await.unwrap();
            let names: Vec<&str> = added.iter().map(Entity::name).collect();
            assert_eq!(names, ["test pagination 1", "test pagination 2", "test pagination 3"]);
        }

        #[tokio::test]
        async fn test_empty_removal_skips_store() {
            let (helper, _) = helper(Arc::new(FailingStore::default()));
            helper.remove_entities(&[]).await.unwrap();
            assert!(helper.add_entities(Vec::new()).await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn test_remove_all_keeps_safe_entities() {
            let store = MemoryStore::new();
            let (helper, _) = helper(Arc::new(store.clone()));
            let added = helper.add_entities_auto("x", 3, 0).await.unwrap();
            helper.remove_all_entities(&added[..1]).await.unwrap();
            let left = helper.get_entities(None).await.unwrap();
            assert_eq!(left, added[..1].to_vec());
        }

        #[tokio::test]
        async fn test_store_failure_propagates() {
            let (helper, _) = helper(Arc::new(FailingStore::default()));
            let err = helper.get_entities(None).await.unwrap_err();
            assert_eq!(err.to_string(), "Store error: Database failure");
        }

        #[tokio::test]
        async fn test_store_calls_take_a_turn() {
            let store = MemoryStore::new();
            let (helper, _) = helper(Arc::new(store));
            let before = helper.session.flow().executed();
            helper.get_entities(None).await.unwrap();
            // wait_for_angular + get
            assert_eq!(helper.session.flow().executed(), before + 2);
        }

        #[test]
        fn test_examples_default() {
            let (helper, _) = helper(Arc::new(MemoryStore::new()));
            assert!(matches!(
                helper.get_add_example().unwrap_err(),
                VeoError::NotImplemented { .. }
            ));
            assert!(helper.get_update_example().is_err());
            assert_eq!(helper.get_validation_example(json!({"a": 1})), json!({"a": 1}));
            let dict = Translations::new(json!({"UI": {"REMOVE": "Remove"}}));
            assert_eq!(helper.translate("UI.REMOVE", &dict), "Remove");
            assert_eq!(helper.translate("UI.NOPE", &dict), "UI.NOPE");
        }
    }
}
