//! MongoDB schema target.
//!
//! This module provides the `MongoTarget` implementation of the `SchemaTarget` trait.

use std::time::Duration;

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, CreateCollectionOptions, ValidationAction, ValidationLevel};
use mongodb::{Client, Database};

use crate::error::{ObjectKind, Result, StoreError};
use crate::schema::{CollectionSchema, IndexSpec, SortOrder, VALIDATION_ACTION, VALIDATION_LEVEL};
use crate::target::{IndexOutcome, SchemaTarget, ValidationRules};

/// Server error codes the target classifies.
mod code {
    pub const INDEX_ALREADY_EXISTS: i32 = 68;
    pub const NAMESPACE_EXISTS: i32 = 48;
    pub const INDEX_OPTIONS_CONFLICT: i32 = 85;
    pub const INDEX_KEY_SPECS_CONFLICT: i32 = 86;
    pub const DOCUMENT_VALIDATION_FAILURE: i32 = 121;
    pub const DUPLICATE_KEY: i32 = 11000;
}

/// Connection settings for [`MongoTarget::connect`].
#[derive(Debug, Clone)]
pub struct MongoSettings {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub uri: String,
    /// Database to initialize.
    pub database: String,
    /// Application name reported to the server.
    pub app_name: String,
    /// Server selection and connect timeout.
    pub timeout: Duration,
}

/// MongoDB-backed schema target.
#[derive(Debug, Clone)]
pub struct MongoTarget {
    db: Database,
}

impl MongoTarget {
    /// Connect to the server and select the database.
    ///
    /// The driver connects lazily; call [`SchemaTarget::ping`] to surface an
    /// unreachable server before doing any work.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the connection string is invalid.
    pub async fn connect(settings: &MongoSettings) -> Result<Self> {
        let mut options = ClientOptions::parse(&settings.uri)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        options.app_name = Some(settings.app_name.clone());
        options.server_selection_timeout = Some(settings.timeout);
        options.connect_timeout = Some(settings.timeout);

        let client = Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(Self::new(client.database(&settings.database)))
    }

    /// Wrap an existing database handle.
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// The underlying database handle.
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    /// Winning-plan stages of a `find`, outermost first, as reported by `explain`.
    ///
    /// # Errors
    ///
    /// Returns an error if the explain command fails.
    pub async fn find_plan_stages(
        &self,
        collection: &str,
        filter: Document,
        sort: Document,
    ) -> Result<Vec<String>> {
        let command = doc! {
            "explain": { "find": collection, "filter": filter, "sort": sort },
            "verbosity": "queryPlanner",
        };
        let reply = self
            .db
            .run_command(command, None)
            .await
            .map_err(|e| classify(e, collection))?;

        let plan = reply
            .get_document("queryPlanner")
            .and_then(|planner| planner.get_document("winningPlan"))
            .map_err(|e| StoreError::Database(format!("unexpected explain reply: {e}")))?;

        let mut stages = Vec::new();
        collect_stages(plan, &mut stages);
        Ok(stages)
    }
}

/// Walk a plan tree through `inputStage`/`inputStages`/`queryPlan`.
fn collect_stages(plan: &Document, stages: &mut Vec<String>) {
    if let Ok(stage) = plan.get_str("stage") {
        stages.push(stage.to_string());
    }
    for key in ["queryPlan", "inputStage"] {
        if let Ok(child) = plan.get_document(key) {
            collect_stages(child, stages);
        }
    }
    if let Ok(children) = plan.get_array("inputStages") {
        for child in children {
            if let Bson::Document(child) = child {
                collect_stages(child, stages);
            }
        }
    }
}

/// Server error code carried by a driver error, if any.
fn server_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Command(e) => Some(e.code),
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        ErrorKind::BulkWrite(f) => f
            .write_errors
            .as_ref()
            .and_then(|errors| errors.first())
            .map(|e| e.code),
        _ => None,
    }
}

fn is_connection_error(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::ServerSelection { .. }
            | ErrorKind::Io(_)
            | ErrorKind::ConnectionPoolCleared { .. }
            | ErrorKind::DnsResolve { .. }
            | ErrorKind::Authentication { .. }
    )
}

/// Map a driver error to the store taxonomy.
fn classify(err: mongodb::error::Error, collection: &str) -> StoreError {
    if is_connection_error(&err) {
        return StoreError::Connection(err.to_string());
    }
    match server_code(&err) {
        Some(code::NAMESPACE_EXISTS) => StoreError::AlreadyExists {
            kind: ObjectKind::Collection,
            name: collection.to_string(),
        },
        Some(code::DOCUMENT_VALIDATION_FAILURE) => StoreError::DocumentRejected {
            collection: collection.to_string(),
            reason: err.to_string(),
        },
        Some(code::DUPLICATE_KEY) => StoreError::DuplicateKey {
            collection: collection.to_string(),
            message: err.to_string(),
        },
        _ => StoreError::Database(err.to_string()),
    }
}

fn classify_index(err: mongodb::error::Error, collection: &str, index: &str) -> StoreError {
    match server_code(&err) {
        Some(code::INDEX_ALREADY_EXISTS) => StoreError::AlreadyExists {
            kind: ObjectKind::Index,
            name: index.to_string(),
        },
        Some(code::INDEX_OPTIONS_CONFLICT | code::INDEX_KEY_SPECS_CONFLICT) => {
            StoreError::IndexConflict {
                collection: collection.to_string(),
                index: index.to_string(),
                message: err.to_string(),
            }
        }
        _ => classify(err, collection),
    }
}

/// Server token for a listed `validationLevel`; absent means the default.
fn level_token(level: Option<&ValidationLevel>) -> &'static str {
    match level {
        None | Some(ValidationLevel::Strict) => VALIDATION_LEVEL,
        Some(ValidationLevel::Moderate) => "moderate",
        Some(ValidationLevel::Off) => "off",
        Some(_) => "unknown",
    }
}

/// Server token for a listed `validationAction`; absent means the default.
fn action_token(action: Option<&ValidationAction>) -> &'static str {
    match action {
        None | Some(ValidationAction::Error) => VALIDATION_ACTION,
        Some(ValidationAction::Warn) => "warn",
        Some(_) => "unknown",
    }
}

/// Read a listed index back into an `IndexSpec`. Indexes with non-numeric keys are skipped.
fn index_from_model(model: &mongodb::IndexModel) -> Option<(String, IndexSpec)> {
    let name = model.options.as_ref().and_then(|o| o.name.clone())?;
    let keys = model
        .keys
        .iter()
        .map(|(field, value)| SortOrder::from_bson(value).map(|order| (field.clone(), order)))
        .collect::<Option<Vec<_>>>()?;
    let unique = model
        .options
        .as_ref()
        .and_then(|o| o.unique)
        .unwrap_or(false);
    Some((name, IndexSpec { keys, unique }))
}

#[async_trait]
impl SchemaTarget for MongoTarget {
    async fn ping(&self) -> Result<()> {
        self.db
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn create_collection(&self, schema: &CollectionSchema) -> Result<()> {
        let options = CreateCollectionOptions::builder()
            .validator(schema.validator())
            .validation_level(ValidationLevel::Strict)
            .validation_action(ValidationAction::Error)
            .build();

        self.db
            .create_collection(schema.name, options)
            .await
            .map_err(|e| classify(e, schema.name))
    }

    async fn count_nonconforming(&self, schema: &CollectionSchema) -> Result<u64> {
        self.db
            .collection::<Document>(schema.name)
            .count_documents(doc! { "$nor": [schema.validator()] }, None)
            .await
            .map_err(|e| classify(e, schema.name))
    }

    async fn attach_validator(&self, schema: &CollectionSchema) -> Result<()> {
        let command = doc! {
            "collMod": schema.name,
            "validator": schema.validator(),
            "validationLevel": VALIDATION_LEVEL,
            "validationAction": VALIDATION_ACTION,
        };
        self.db
            .run_command(command, None)
            .await
            .map_err(|e| classify(e, schema.name))?;
        Ok(())
    }

    async fn collection_names(&self) -> Result<Vec<String>> {
        self.db
            .list_collection_names(None)
            .await
            .map_err(|e| classify(e, ""))
    }

    async fn validation_rules(&self, collection: &str) -> Result<ValidationRules> {
        let mut cursor = self
            .db
            .list_collections(doc! { "name": collection }, None)
            .await
            .map_err(|e| classify(e, collection))?;

        let Some(spec) = cursor
            .try_next()
            .await
            .map_err(|e| classify(e, collection))?
        else {
            return Ok(ValidationRules::strict(None));
        };

        let options = spec.options;
        Ok(ValidationRules {
            validator: options.validator,
            level: level_token(options.validation_level.as_ref()).to_string(),
            action: action_token(options.validation_action.as_ref()).to_string(),
        })
    }

    async fn create_index(&self, collection: &str, index: &IndexSpec) -> Result<IndexOutcome> {
        let name = index.name();
        let mut definition = doc! { "key": index.key_document(), "name": name.as_str() };
        if index.unique {
            definition.insert("unique", true);
        }
        let command = doc! { "createIndexes": collection, "indexes": [definition] };

        let reply = self
            .db
            .run_command(command, None)
            .await
            .map_err(|e| classify_index(e, collection, &name))?;

        // Sharded replies nest the counts under `raw`; treat those as created.
        let outcome = match (reply.get_i32("numIndexesBefore"), reply.get_i32("numIndexesAfter")) {
            (Ok(before), Ok(after)) if before == after => IndexOutcome::AlreadyPresent,
            _ => IndexOutcome::Created,
        };
        Ok(outcome)
    }

    async fn list_indexes(&self, collection: &str) -> Result<Vec<(String, IndexSpec)>> {
        let cursor = self
            .db
            .collection::<Document>(collection)
            .list_indexes(None)
            .await
            .map_err(|e| classify(e, collection))?;
        let models: Vec<mongodb::IndexModel> = cursor
            .try_collect()
            .await
            .map_err(|e| classify(e, collection))?;

        Ok(models
            .iter()
            .filter_map(index_from_model)
            .filter(|(name, _)| name != "_id_")
            .collect())
    }

    async fn count_documents(&self, collection: &str) -> Result<u64> {
        self.db
            .collection::<Document>(collection)
            .count_documents(None, None)
            .await
            .map_err(|e| classify(e, collection))
    }

    async fn insert_document(&self, collection: &str, document: Document) -> Result<()> {
        self.db
            .collection::<Document>(collection)
            .insert_one(document, None)
            .await
            .map_err(|e| classify(e, collection))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_stages_are_collected_depth_first() {
        let plan = doc! {
            "stage": "FETCH",
            "inputStage": {
                "stage": "IXSCAN",
                "indexName": "status_1",
            },
        };
        let mut stages = Vec::new();
        collect_stages(&plan, &mut stages);
        assert_eq!(stages, vec!["FETCH", "IXSCAN"]);
    }

    #[test]
    fn sbe_plans_are_unwrapped() {
        let plan = doc! {
            "queryPlan": {
                "stage": "SORT",
                "inputStage": { "stage": "COLLSCAN" },
            },
        };
        let mut stages = Vec::new();
        collect_stages(&plan, &mut stages);
        assert_eq!(stages, vec!["SORT", "COLLSCAN"]);
    }

    #[test]
    fn listed_validation_modes_map_to_server_tokens() {
        assert_eq!(level_token(None), "strict");
        assert_eq!(level_token(Some(&ValidationLevel::Moderate)), "moderate");
        assert_eq!(action_token(None), "error");
        assert_eq!(action_token(Some(&ValidationAction::Warn)), "warn");
    }

    #[test]
    fn listed_index_is_read_back() {
        let model = mongodb::IndexModel::builder()
            .keys(doc! { "user_id": 1, "fund_id": 1 })
            .options(
                mongodb::options::IndexOptions::builder()
                    .name("user_id_1_fund_id_1".to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        let (name, spec) = index_from_model(&model).unwrap();
        assert_eq!(name, "user_id_1_fund_id_1");
        assert_eq!(
            spec,
            IndexSpec::compound(&[
                ("user_id", SortOrder::Ascending),
                ("fund_id", SortOrder::Ascending),
            ])
            .unique()
        );
    }

    #[test]
    fn text_index_is_skipped() {
        let model = mongodb::IndexModel::builder()
            .keys(doc! { "description": "text" })
            .options(
                mongodb::options::IndexOptions::builder()
                    .name("description_text".to_string())
                    .build(),
            )
            .build();
        assert!(index_from_model(&model).is_none());
    }
}
