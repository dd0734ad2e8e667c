//! The schema initializer.
//!
//! One linear pass over the declared collections: create each collection
//! with its validator, then create its indexes. "Already exists" is
//! success; everything else aborts the pass with the failing step named.

use tracing::{debug, info, instrument, warn};

use crate::error::{InitError, StoreError};
use crate::schema::{all_collections, CollectionSchema};
use crate::target::{IndexOutcome, SchemaTarget};

/// What happened to one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    /// Collection name.
    pub name: String,
    /// `true` if the collection was created, `false` if it already existed.
    pub created: bool,
    /// Each declared index by name with its outcome.
    pub indexes: Vec<(String, IndexOutcome)>,
}

/// Summary of an initialization run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitReport {
    /// Per-collection outcomes, in initialization order.
    pub collections: Vec<CollectionOutcome>,
}

impl InitReport {
    /// Names of the collections handled.
    #[must_use]
    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of collections created by this run.
    #[must_use]
    pub fn collections_created(&self) -> usize {
        self.collections.iter().filter(|c| c.created).count()
    }

    /// Number of indexes created by this run.
    #[must_use]
    pub fn indexes_created(&self) -> usize {
        self.collections
            .iter()
            .flat_map(|c| &c.indexes)
            .filter(|(_, outcome)| *outcome == IndexOutcome::Created)
            .count()
    }

    /// Total number of declared indexes handled.
    #[must_use]
    pub fn index_count(&self) -> usize {
        self.collections.iter().map(|c| c.indexes.len()).sum()
    }

    /// Check if the run changed nothing.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.collections_created() == 0 && self.indexes_created() == 0
    }
}

/// Brings a database to the declared schema.
pub struct SchemaInitializer<'a, T: SchemaTarget + ?Sized> {
    target: &'a T,
    collections: Vec<CollectionSchema>,
}

impl<'a, T: SchemaTarget + ?Sized> SchemaInitializer<'a, T> {
    /// Create an initializer for every declared collection.
    #[must_use]
    pub fn new(target: &'a T) -> Self {
        Self {
            target,
            collections: all_collections(),
        }
    }

    /// Restrict or replace the collections to initialize.
    #[must_use]
    pub fn with_collections(mut self, collections: Vec<CollectionSchema>) -> Self {
        self.collections = collections;
        self
    }

    /// Run the initialization pass.
    ///
    /// # Errors
    ///
    /// Returns an `InitError` naming the failing step on connection failure,
    /// validation conflict, index conflict, or any other database error.
    #[instrument(skip(self), fields(collections = self.collections.len()))]
    pub async fn run(&self) -> Result<InitReport, InitError> {
        self.target
            .ping()
            .await
            .map_err(|e| InitError::new("connect to database", e))?;

        let mut report = InitReport::default();
        for schema in &self.collections {
            let created = self.ensure_collection(schema).await?;
            let indexes = self.ensure_indexes(schema).await?;
            report.collections.push(CollectionOutcome {
                name: schema.name.to_string(),
                created,
                indexes,
            });
        }

        info!(
            collections_created = report.collections_created(),
            indexes_created = report.indexes_created(),
            "Schema initialization complete"
        );
        Ok(report)
    }

    /// Create the collection, or bring an existing one under the validator.
    ///
    /// Returns `true` if the collection was created.
    async fn ensure_collection(&self, schema: &CollectionSchema) -> Result<bool, InitError> {
        let step = || format!("create collection `{}`", schema.name);

        match self.target.create_collection(schema).await {
            Ok(()) => {
                info!(collection = schema.name, "Created collection with validator");
                return Ok(true);
            }
            Err(e) if e.is_already_exists() => {
                debug!(collection = schema.name, "Collection already exists");
            }
            Err(e) => return Err(InitError::new(step(), e)),
        }

        let nonconforming = self
            .target
            .count_nonconforming(schema)
            .await
            .map_err(|e| InitError::new(step(), e))?;
        if nonconforming > 0 {
            warn!(
                collection = schema.name,
                nonconforming, "Existing documents violate the declared schema"
            );
            return Err(InitError::new(
                format!("attach validator to `{}`", schema.name),
                StoreError::ValidationConflict {
                    collection: schema.name.to_string(),
                    nonconforming,
                },
            ));
        }

        self.target
            .attach_validator(schema)
            .await
            .map_err(|e| InitError::new(format!("attach validator to `{}`", schema.name), e))?;
        debug!(collection = schema.name, "Validator attached to existing collection");
        Ok(false)
    }

    async fn ensure_indexes(
        &self,
        schema: &CollectionSchema,
    ) -> Result<Vec<(String, IndexOutcome)>, InitError> {
        let mut outcomes = Vec::with_capacity(schema.indexes.len());

        for index in &schema.indexes {
            let name = index.name();
            let outcome = match self.target.create_index(schema.name, index).await {
                Ok(outcome) => outcome,
                Err(e) if e.is_already_exists() => IndexOutcome::AlreadyPresent,
                Err(e) => {
                    return Err(InitError::new(
                        format!("create index `{name}` on `{}`", schema.name),
                        e,
                    ))
                }
            };

            match outcome {
                IndexOutcome::Created => {
                    info!(collection = schema.name, index = %name, unique = index.unique, "Created index");
                }
                IndexOutcome::AlreadyPresent => {
                    debug!(collection = schema.name, index = %name, "Index already present");
                }
            }
            outcomes.push((name, outcome));
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTarget;
    use crate::schema::{self, coll, IndexSpec};
    use bson::doc;

    #[tokio::test]
    async fn fresh_database_gets_everything() {
        let target = MemoryTarget::new();
        let report = SchemaInitializer::new(&target).run().await.unwrap();

        assert_eq!(
            report.collection_names(),
            vec![
                coll::USERS,
                coll::FUNDS,
                coll::TRANSACTIONS,
                coll::USER_FUND_SUBSCRIPTIONS
            ]
        );
        assert_eq!(report.collections_created(), 4);
        assert_eq!(report.indexes_created(), 15);
        assert!(!report.is_noop());
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let target = MemoryTarget::new();
        SchemaInitializer::new(&target).run().await.unwrap();
        let report = SchemaInitializer::new(&target).run().await.unwrap();

        assert!(report.is_noop());
        assert_eq!(report.index_count(), 15);
        assert!(report
            .collections
            .iter()
            .flat_map(|c| &c.indexes)
            .all(|(_, o)| *o == IndexOutcome::AlreadyPresent));
    }

    #[tokio::test]
    async fn initialized_collections_reject_bad_writes() {
        let target = MemoryTarget::new();
        SchemaInitializer::new(&target).run().await.unwrap();

        let user = |email: &str| {
            doc! {
                "email": email,
                "hashed_password": "x",
                "full_name": "Ana",
                "role": "client",
                "is_active": true,
            }
        };

        target.insert_document(coll::USERS, user("ana@example.com")).await.unwrap();
        assert!(matches!(
            target.insert_document(coll::USERS, user("ana@example.com")).await,
            Err(StoreError::DuplicateKey { .. })
        ));

        let mut superadmin = user("root@example.com");
        superadmin.insert("role", "superadmin");
        assert!(matches!(
            target.insert_document(coll::USERS, superadmin).await,
            Err(StoreError::DocumentRejected { .. })
        ));

        let mut no_email = user("unused@example.com");
        no_email.remove("email");
        assert!(matches!(
            target.insert_document(coll::USERS, no_email).await,
            Err(StoreError::DocumentRejected { .. })
        ));

        let pair = doc! {
            "user_id": "u1",
            "fund_id": "f1",
            "amount": crate::decimal::to_decimal128(75_000).unwrap(),
            "is_active": true,
        };
        target
            .insert_document(coll::USER_FUND_SUBSCRIPTIONS, pair.clone())
            .await
            .unwrap();
        assert!(matches!(
            target.insert_document(coll::USER_FUND_SUBSCRIPTIONS, pair).await,
            Err(StoreError::DuplicateKey { .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_database_fails_before_any_step() {
        let target = MemoryTarget::unreachable();
        let err = SchemaInitializer::new(&target).run().await.unwrap_err();

        assert_eq!(err.step, "connect to database");
        assert!(matches!(err.source, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn existing_conforming_collection_gets_the_validator() {
        let target = MemoryTarget::new().with_documents(
            coll::FUNDS,
            vec![doc! {
                "name": "DEUDAPRIVADA",
                "category": "FIC",
                "minimum_amount": crate::decimal::to_decimal128(50_000).unwrap(),
            }],
        );
        let report = SchemaInitializer::new(&target).run().await.unwrap();

        let funds = &report.collections[1];
        assert_eq!(funds.name, coll::FUNDS);
        assert!(!funds.created);
        let rules = target.validation_rules(coll::FUNDS).await.unwrap();
        assert_eq!(rules.validator, Some(schema::funds().validator()));
        assert!(rules.rejects_invalid_writes());
    }

    #[tokio::test]
    async fn rerun_restores_strict_validation() {
        let target = MemoryTarget::new();
        SchemaInitializer::new(&target).run().await.unwrap();
        let target = target.with_validation_mode(coll::USERS, "moderate", "warn");

        SchemaInitializer::new(&target).run().await.unwrap();

        let rules = target.validation_rules(coll::USERS).await.unwrap();
        assert_eq!(rules.level, "strict");
        assert_eq!(rules.action, "error");
    }

    #[tokio::test]
    async fn nonconforming_data_is_a_validation_conflict() {
        let target = MemoryTarget::new().with_documents(
            coll::USERS,
            vec![doc! { "email": "a@b.co", "role": "superadmin" }],
        );
        let err = SchemaInitializer::new(&target).run().await.unwrap_err();

        assert_eq!(err.step, "attach validator to `users`");
        assert!(matches!(
            err.source,
            StoreError::ValidationConflict { ref collection, nonconforming: 1 } if collection == "users"
        ));
    }

    #[tokio::test]
    async fn conflicting_index_names_the_index() {
        let target = MemoryTarget::new().with_index(
            coll::USER_FUND_SUBSCRIPTIONS,
            "user_id_1_fund_id_1",
            IndexSpec::compound(&[
                ("user_id", schema::SortOrder::Ascending),
                ("fund_id", schema::SortOrder::Ascending),
            ]),
        );
        let err = SchemaInitializer::new(&target).run().await.unwrap_err();

        assert_eq!(
            err.step,
            "create index `user_id_1_fund_id_1` on `user_fund_subscriptions`"
        );
        assert!(matches!(err.source, StoreError::IndexConflict { .. }));
    }

    #[tokio::test]
    async fn subset_of_collections() {
        let target = MemoryTarget::new();
        let report = SchemaInitializer::new(&target)
            .with_collections(vec![schema::transactions()])
            .run()
            .await
            .unwrap();

        assert_eq!(report.collection_names(), vec![coll::TRANSACTIONS]);
        assert_eq!(
            target.collection_names().await.unwrap(),
            vec![coll::TRANSACTIONS.to_string()]
        );
    }
}
