//! Command-line schema initializer for the funds platform.
//!
//! Connects to `MongoDB`, then creates the platform collections with their
//! validators and indexes (`init`), reports drift (`verify`), or seeds the
//! default fund catalog (`seed`).
//!
//! # Configuration
//!
//! Connection settings come from a `.secrets/mongodb.json` file or from the
//! `MONGODB_URL`, `DATABASE_NAME`, `MONGODB_TIMEOUT_SECONDS` and `APP_NAME`
//! environment variables. `--uri` and `--database` override both.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod config;
pub mod error;
pub mod run;

pub use cli::{Cli, Command};
pub use config::InitConfig;
pub use error::CliError;
pub use run::{execute, Outcome};
