//! The storage seam the initializer, verifier and seeder run against.

use async_trait::async_trait;
use bson::Document;

use crate::error::Result;
use crate::schema::{CollectionSchema, IndexSpec, VALIDATION_ACTION, VALIDATION_LEVEL};

/// Result of asking the target to create an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexOutcome {
    /// The index was built.
    Created,
    /// An identical index was already present.
    AlreadyPresent,
}

/// How a collection enforces documents on write.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRules {
    /// Attached validator, if any.
    pub validator: Option<Document>,
    /// `validationLevel`: `strict`, `moderate` or `off`.
    pub level: String,
    /// `validationAction`: `error` or `warn`.
    pub action: String,
}

impl ValidationRules {
    /// Rules with the given validator and the server defaults.
    #[must_use]
    pub fn strict(validator: Option<Document>) -> Self {
        Self {
            validator,
            level: VALIDATION_LEVEL.to_string(),
            action: VALIDATION_ACTION.to_string(),
        }
    }

    /// Check if invalid writes are rejected on every write.
    #[must_use]
    pub fn rejects_invalid_writes(&self) -> bool {
        self.level == VALIDATION_LEVEL && self.action == VALIDATION_ACTION
    }
}

/// Schema operations on a database.
///
/// This trait abstracts the database, allowing for different implementations
/// (MongoDB, in-memory for testing).
#[async_trait]
pub trait SchemaTarget: Send + Sync {
    // =========================================================================
    // Connectivity
    // =========================================================================

    /// Check that the database answers.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the database is unreachable.
    async fn ping(&self) -> Result<()>;

    // =========================================================================
    // Collections
    // =========================================================================

    /// Create a collection with the schema's validator attached.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the collection exists.
    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()>;

    /// Count documents in an existing collection that fail the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn count_nonconforming(&self, schema: &CollectionSchema) -> Result<u64>;

    /// Replace the validator of an existing collection with the schema's.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn attach_validator(&self, schema: &CollectionSchema) -> Result<()>;

    /// Names of the collections in the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn collection_names(&self) -> Result<Vec<String>>;

    /// Validator, validation level and validation action of a collection.
    ///
    /// A missing collection reports no validator and the server defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn validation_rules(&self, collection: &str) -> Result<ValidationRules>;

    // =========================================================================
    // Indexes
    // =========================================================================

    /// Create an index.
    ///
    /// # Errors
    ///
    /// - `StoreError::AlreadyExists` if the target reports the index exists.
    /// - `StoreError::IndexConflict` if an index with the same name or keys
    ///   has different options.
    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<IndexOutcome>;

    /// Secondary indexes of a collection, excluding `_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_indexes(&self, collection: &str) -> Result<Vec<(String, IndexSpec)>>;

    // =========================================================================
    // Documents
    // =========================================================================

    /// Count documents in a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn count_documents(&self, collection: &str) -> Result<u64>;

    /// Insert one document.
    ///
    /// # Errors
    ///
    /// - `StoreError::DocumentRejected` if the validator rejects it.
    /// - `StoreError::DuplicateKey` if a unique index is violated.
    async fn insert_document(&self, collection: &str, document: Document) -> Result<()>;
}
