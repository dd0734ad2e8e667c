//! Read-only schema verification.
//!
//! Compares a database against the declared collections and reports every
//! difference as a [`Drift`]. Nothing is written.

use std::fmt;

use tracing::{debug, instrument};

use crate::error::Result;
use crate::schema::{all_collections, CollectionSchema, VALIDATION_ACTION, VALIDATION_LEVEL};
use crate::target::SchemaTarget;

/// One difference between the database and the declared schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Drift {
    /// The collection does not exist.
    MissingCollection {
        /// Collection name.
        collection: String,
    },
    /// The collection exists without a validator.
    MissingValidator {
        /// Collection name.
        collection: String,
    },
    /// The collection's validator differs from the declared one.
    ValidatorMismatch {
        /// Collection name.
        collection: String,
    },
    /// The validator is attached with a weaker level or action.
    ValidationMode {
        /// Collection name.
        collection: String,
        /// Reported `validationLevel`.
        level: String,
        /// Reported `validationAction`.
        action: String,
    },
    /// A declared index is absent.
    MissingIndex {
        /// Collection name.
        collection: String,
        /// Expected index name.
        index: String,
    },
    /// An index exists under the declared name with other keys or options.
    IndexMismatch {
        /// Collection name.
        collection: String,
        /// Index name.
        index: String,
    },
}

impl fmt::Display for Drift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCollection { collection } => {
                write!(f, "collection `{collection}` is missing")
            }
            Self::MissingValidator { collection } => {
                write!(f, "collection `{collection}` has no validator")
            }
            Self::ValidatorMismatch { collection } => {
                write!(f, "collection `{collection}` has a different validator")
            }
            Self::ValidationMode {
                collection,
                level,
                action,
            } => write!(
                f,
                "collection `{collection}` validates with level `{level}` and action `{action}`, expected `{VALIDATION_LEVEL}` and `{VALIDATION_ACTION}`"
            ),
            Self::MissingIndex { collection, index } => {
                write!(f, "index `{index}` on `{collection}` is missing")
            }
            Self::IndexMismatch { collection, index } => {
                write!(f, "index `{index}` on `{collection}` has different keys or options")
            }
        }
    }
}

/// Result of a verification pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    /// Number of collections checked.
    pub checked: usize,
    /// Every difference found.
    pub drift: Vec<Drift>,
}

impl SchemaReport {
    /// Check if the database matches the declared schema.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.drift.is_empty()
    }
}

/// Verify every declared collection.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
pub async fn verify<T: SchemaTarget + ?Sized>(target: &T) -> Result<SchemaReport> {
    verify_collections(target, &all_collections()).await
}

/// Verify the given collections.
///
/// # Errors
///
/// Returns an error if the database cannot be read.
#[instrument(skip_all, fields(collections = schemas.len()))]
pub async fn verify_collections<T: SchemaTarget + ?Sized>(
    target: &T,
    schemas: &[CollectionSchema],
) -> Result<SchemaReport> {
    target.ping().await?;
    let existing = target.collection_names().await?;

    let mut report = SchemaReport {
        checked: schemas.len(),
        drift: Vec::new(),
    };

    for schema in schemas {
        let collection = schema.name.to_string();
        if !existing.iter().any(|name| name == schema.name) {
            report.drift.push(Drift::MissingCollection { collection });
            continue;
        }

        let rules = target.validation_rules(schema.name).await?;
        match &rules.validator {
            None => report.drift.push(Drift::MissingValidator {
                collection: collection.clone(),
            }),
            Some(validator) if *validator != schema.validator() => {
                report.drift.push(Drift::ValidatorMismatch {
                    collection: collection.clone(),
                });
            }
            Some(_) => {}
        }
        if rules.validator.is_some() && !rules.rejects_invalid_writes() {
            report.drift.push(Drift::ValidationMode {
                collection: collection.clone(),
                level: rules.level,
                action: rules.action,
            });
        }

        let indexes = target.list_indexes(schema.name).await?;
        for declared in &schema.indexes {
            let index = declared.name();
            match indexes.iter().find(|(name, _)| *name == index) {
                None => report.drift.push(Drift::MissingIndex {
                    collection: collection.clone(),
                    index,
                }),
                Some((_, found)) if found != declared => {
                    report.drift.push(Drift::IndexMismatch {
                        collection: collection.clone(),
                        index,
                    });
                }
                Some(_) => {}
            }
        }
    }

    debug!(drift = report.drift.len(), "Schema verification finished");
    Ok(report)
}
