//! MongoDB schema layer for the funds platform.
//!
//! This crate declares the four platform collections with their
//! `$jsonSchema` validators and indexes, and brings a database to that
//! declaration idempotently.
//!
//! # Architecture
//!
//! The declared collections:
//!
//! - `users`: Client and admin accounts, unique by `email`
//! - `funds`: The investment fund catalog
//! - `transactions`: Subscription and cancellation history
//! - `user_fund_subscriptions`: Active holdings, unique per `(user_id, fund_id)`
//!
//! Operations run against a [`SchemaTarget`]: [`MongoTarget`] for a live
//! server, [`MemoryTarget`] for tests.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use funds_store::{MongoSettings, MongoTarget, SchemaInitializer};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let target = MongoTarget::connect(&MongoSettings {
//!     uri: "mongodb://localhost:27017".into(),
//!     database: "btg_pactual".into(),
//!     app_name: "funds-init".into(),
//!     timeout: Duration::from_secs(10),
//! })
//! .await?;
//!
//! let report = SchemaInitializer::new(&target).run().await?;
//! println!("{:?}", report.collection_names());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod decimal;
pub mod documents;
pub mod error;
pub mod init;
pub mod memory;
pub mod mongo;
pub mod schema;
pub mod seed;
pub mod target;
pub mod validate;
pub mod verify;

pub use documents::ToDocument;
pub use error::{InitError, ObjectKind, Result, StoreError};
pub use init::{CollectionOutcome, InitReport, SchemaInitializer};
pub use memory::MemoryTarget;
pub use mongo::{MongoSettings, MongoTarget};
pub use schema::{CollectionSchema, FieldSpec, FieldType, IndexSpec, SortOrder};
pub use seed::{seed_default_funds, seed_funds};
pub use target::{IndexOutcome, SchemaTarget, ValidationRules};
pub use verify::{verify, verify_collections, Drift, SchemaReport};
