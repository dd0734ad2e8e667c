//! Command error types.

use funds_store::{InitError, StoreError};

/// Errors that end a `funds-init` run with a failure exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Initialization aborted at a named step.
    #[error(transparent)]
    Init(#[from] InitError),

    /// A store operation outside initialization failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// Verification found differences from the declared schema.
    #[error("schema drift: {0} difference(s) from the declared schema")]
    Drift(usize),
}
