//! Error types for the funds domain.

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Errors raised when building domain records.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// A required text field was empty.
    #[error("field must not be empty: {0}")]
    EmptyField(&'static str),

    /// Unknown enum token read back from storage.
    #[error("unknown {kind} value: {value}")]
    UnknownVariant {
        /// The enum being parsed.
        kind: &'static str,
        /// The offending token.
        value: String,
    },
}
