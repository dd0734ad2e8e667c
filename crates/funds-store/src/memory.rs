//! In-memory schema target.
//!
//! Behaves like a MongoDB database for the operations the initializer,
//! verifier and seeder use: validators reject writes, unique indexes reject
//! duplicates, and conflicting index definitions fail the way the server
//! does. An unreachable target can be simulated.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::error::{ObjectKind, Result, StoreError};
use crate::schema::{CollectionSchema, IndexSpec};
use crate::target::{IndexOutcome, SchemaTarget, ValidationRules};
use crate::validate;

#[derive(Debug, Default, Clone)]
struct MemoryCollection {
    /// Attached validator; `None` for collections created without one.
    schema: Option<CollectionSchema>,
    /// `(level, action)` when set to something other than strict/error.
    mode: Option<(String, String)>,
    /// Secondary indexes by name.
    indexes: BTreeMap<String, IndexSpec>,
    documents: Vec<Document>,
}

/// A database held in process memory.
#[derive(Debug, Default)]
pub struct MemoryTarget {
    collections: Mutex<HashMap<String, MemoryCollection>>,
    unreachable: bool,
}

impl MemoryTarget {
    /// Create an empty database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a database that fails every call with a connection error.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Add a collection without a validator, holding `documents`.
    ///
    /// Models data written before the schema was declared.
    #[must_use]
    pub fn with_documents(self, collection: &str, documents: Vec<Document>) -> Self {
        if let Ok(mut state) = self.collections.lock() {
            state
                .entry(collection.to_string())
                .or_default()
                .documents
                .extend(documents);
        }
        self
    }

    /// Add an index under an explicit name.
    #[must_use]
    pub fn with_index(self, collection: &str, name: &str, index: IndexSpec) -> Self {
        if let Ok(mut state) = self.collections.lock() {
            state
                .entry(collection.to_string())
                .or_default()
                .indexes
                .insert(name.to_string(), index);
        }
        self
    }

    /// Override the validation level and action of a collection.
    ///
    /// Models a validator attached by hand with a weaker mode. Attaching the
    /// declared validator resets it.
    #[must_use]
    pub fn with_validation_mode(self, collection: &str, level: &str, action: &str) -> Self {
        if let Ok(mut state) = self.collections.lock() {
            state.entry(collection.to_string()).or_default().mode =
                Some((level.to_string(), action.to_string()));
        }
        self
    }

    fn state(&self) -> Result<MutexGuard<'_, HashMap<String, MemoryCollection>>> {
        if self.unreachable {
            return Err(StoreError::Connection(
                "server selection timed out: memory target is unreachable".into(),
            ));
        }
        self.collections
            .lock()
            .map_err(|e| StoreError::Database(format!("memory target poisoned: {e}")))
    }
}

/// Values of an index's fields in a document; missing fields index as null.
///
/// `Int32` widens to `Int64` so equal integers collide as they do on the
/// server. Doubles and decimals compare by representation only.
fn index_key(index: &IndexSpec, document: &Document) -> Vec<Bson> {
    index
        .fields()
        .map(|field| match document.get(field) {
            None => Bson::Null,
            Some(Bson::Int32(n)) => Bson::Int64(i64::from(*n)),
            Some(value) => value.clone(),
        })
        .collect()
}

#[async_trait]
impl SchemaTarget for MemoryTarget {
    async fn ping(&self) -> Result<()> {
        self.state().map(|_| ())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let mut state = self.state()?;
        if state.contains_key(schema.name) {
            return Err(StoreError::AlreadyExists {
                kind: ObjectKind::Collection,
                name: schema.name.to_string(),
            });
        }
        state.insert(
            schema.name.to_string(),
            MemoryCollection {
                schema: Some(schema.clone()),
                ..MemoryCollection::default()
            },
        );
        Ok(())
    }

    async fn count_nonconforming(&self, schema: &CollectionSchema) -> Result<u64> {
        let state = self.state()?;
        let count = state.get(schema.name).map_or(0, |c| {
            c.documents
                .iter()
                .filter(|d| !validate::conforms(schema, d))
                .count()
        });
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn attach_validator(&self, schema: &CollectionSchema) -> Result<()> {
        let mut state = self.state()?;
        let collection = state
            .get_mut(schema.name)
            .ok_or_else(|| StoreError::Database(format!("ns does not exist: {}", schema.name)))?;
        collection.schema = Some(schema.clone());
        collection.mode = None;
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>> {
        let state = self.state()?;
        let mut names: Vec<_> = state.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn validation_rules(&self, collection: &str) -> Result<ValidationRules> {
        let state = self.state()?;
        let Some(found) = state.get(collection) else {
            return Ok(ValidationRules::strict(None));
        };
        let mut rules = ValidationRules::strict(found.schema.as_ref().map(CollectionSchema::validator));
        if let Some((level, action)) = &found.mode {
            rules.level.clone_from(level);
            rules.action.clone_from(action);
        }
        Ok(rules)
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<IndexOutcome> {
        let mut state = self.state()?;
        let target = state.entry(collection.to_string()).or_default();
        let name = index.name();

        if let Some(existing) = target.indexes.get(&name) {
            if existing == index {
                return Ok(IndexOutcome::AlreadyPresent);
            }
            return Err(StoreError::IndexConflict {
                collection: collection.to_string(),
                index: name,
                message: "an index with the same name has different options".into(),
            });
        }

        if let Some((other, _)) = target.indexes.iter().find(|(_, i)| i.keys == index.keys) {
            return Err(StoreError::IndexConflict {
                collection: collection.to_string(),
                index: name,
                message: format!("index `{other}` already covers the same keys"),
            });
        }

        if index.unique {
            let mut seen = Vec::new();
            for document in &target.documents {
                let key = index_key(index, document);
                if seen.contains(&key) {
                    return Err(StoreError::DuplicateKey {
                        collection: collection.to_string(),
                        message: format!("cannot build unique index `{name}` over duplicates"),
                    });
                }
                seen.push(key);
            }
        }

        target.indexes.insert(name, index.clone());
        Ok(IndexOutcome::Created)
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<(String, IndexSpec)>> {
        let state = self.state()?;
        Ok(state
            .get(collection)
            .map(|c| {
                c.indexes
                    .iter()
                    .map(|(name, index)| (name.clone(), index.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        let state = self.state()?;
        let count = state.get(collection).map_or(0, |c| c.documents.len());
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn insert_document(&self, collection: &str, document: Document) -> Result<()> {
        let mut state = self.state()?;
        let target = state.entry(collection.to_string()).or_default();

        let enforced = !matches!(
            &target.mode,
            Some((level, action)) if level == "off" || action == "warn"
        );
        if let (Some(schema), true) = (&target.schema, enforced) {
            validate::check(schema, &document).map_err(|reason| StoreError::DocumentRejected {
                collection: collection.to_string(),
                reason,
            })?;
        }

        for (name, index) in target.indexes.iter().filter(|(_, i)| i.unique) {
            let key = index_key(index, &document);
            if target.documents.iter().any(|d| index_key(index, d) == key) {
                return Err(StoreError::DuplicateKey {
                    collection: collection.to_string(),
                    message: format!("index `{name}` already holds {key:?}"),
                });
            }
        }

        target.documents.push(document);
        Ok(())
    }
}
