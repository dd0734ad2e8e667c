//! Conversion between whole-peso amounts and BSON `decimal` values.
//!
//! Amounts go through their decimal string form, so a stored value reads
//! back exactly as written and a fractional or non-finite value is refused.

use bson::Decimal128;

/// Errors converting between pesos and stored decimals.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecimalError {
    /// The amount has no `decimal` representation.
    #[error("amount {0} cannot be stored as a decimal")]
    Unrepresentable(i64),

    /// The stored value is not a whole number of pesos that fits in an `i64`.
    #[error("decimal {0} is not a whole number of pesos")]
    NotWholePesos(String),
}

/// Encode whole pesos as a `decimal`.
///
/// # Errors
///
/// Returns `DecimalError::Unrepresentable` if the driver rejects the value.
pub fn to_decimal128(amount: i64) -> Result<Decimal128, DecimalError> {
    amount
        .to_string()
        .parse()
        .map_err(|_| DecimalError::Unrepresentable(amount))
}

/// Decode a `decimal` holding a whole number of pesos.
///
/// # Errors
///
/// Returns `DecimalError::NotWholePesos` for fractional, non-finite or
/// out-of-range values.
pub fn from_decimal128(value: &Decimal128) -> Result<i64, DecimalError> {
    let text = value.to_string();
    text.parse().map_err(|_| DecimalError::NotWholePesos(text))
}
