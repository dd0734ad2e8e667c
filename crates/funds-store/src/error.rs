//! Error types for the funds store.

use std::fmt;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Kind of schema object an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// A collection.
    Collection,
    /// An index.
    Index,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Collection => f.write_str("collection"),
            Self::Index => f.write_str("index"),
        }
    }
}

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The collection or index already exists.
    #[error("{kind} already exists: {name}")]
    AlreadyExists {
        /// What already exists.
        kind: ObjectKind,
        /// Its name.
        name: String,
    },

    /// The database could not be reached.
    #[error("connection failure: {0}")]
    Connection(String),

    /// Existing documents do not satisfy the declared validator.
    #[error("{nonconforming} existing document(s) in `{collection}` violate the declared schema")]
    ValidationConflict {
        /// The collection holding the documents.
        collection: String,
        /// How many documents fail validation.
        nonconforming: u64,
    },

    /// An index with the same name or keys exists with different options.
    #[error("index `{index}` on `{collection}` conflicts with an existing index: {message}")]
    IndexConflict {
        /// The collection.
        collection: String,
        /// The declared index name.
        index: String,
        /// Server or target message.
        message: String,
    },

    /// A write was rejected by the collection validator.
    #[error("document rejected by `{collection}` validator: {reason}")]
    DocumentRejected {
        /// The collection.
        collection: String,
        /// Why the document was rejected.
        reason: String,
    },

    /// A write violated a unique index.
    #[error("duplicate key in `{collection}`: {message}")]
    DuplicateKey {
        /// The collection.
        collection: String,
        /// Server or target message.
        message: String,
    },

    /// An amount could not be converted to or from a stored decimal.
    #[error(transparent)]
    Decimal(#[from] crate::decimal::DecimalError),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(String),
}

impl StoreError {
    /// Check if this is the recoverable "already exists" condition.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// A fatal initialization failure, naming the step that failed.
#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source}")]
pub struct InitError {
    /// Human-readable step, e.g. ``create index `email_1` on `users` ``.
    pub step: String,

    /// The underlying error.
    #[source]
    pub source: StoreError,
}

impl InitError {
    pub(crate) fn new(step: impl Into<String>, source: StoreError) -> Self {
        Self {
            step: step.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_error_names_the_step() {
        let err = InitError::new(
            "create collection `users`",
            StoreError::Connection("server selection timeout".into()),
        );
        assert_eq!(
            err.to_string(),
            "create collection `users` failed: connection failure: server selection timeout"
        );
    }

    #[test]
    fn already_exists_is_recognised() {
        let err = StoreError::AlreadyExists {
            kind: ObjectKind::Index,
            name: "email_1".into(),
        };
        assert!(err.is_already_exists());
        assert_eq!(err.to_string(), "index already exists: email_1");
        assert!(!StoreError::Database("x".into()).is_already_exists());
    }
}
