//! Core types for the funds platform.
//!
//! This crate provides the domain records persisted by the platform:
//!
//! - **Identifiers**: `UserId`, `FundId`, `SubscriptionId`, `TransactionId`
//! - **Users**: `User`, `Role`, `NotificationPreference`
//! - **Funds**: `Fund`, `FundCategory`, `default_funds`
//! - **Transactions**: `Transaction`, `TransactionType`, `TransactionStatus`
//! - **Subscriptions**: `UserFundSubscription`
//!
//! # Amounts
//!
//! Amounts are whole Colombian pesos (COP) held as `i64`. The storage layer
//! encodes them as BSON `decimal` values.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

/// Define a closed set of stored string tokens.
///
/// Generates `as_str`, `ALL`, `Display` and `FromStr` so the validator enums
/// in the store crate are built from the same list the domain uses.
macro_rules! token_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $token)] $variant ),+
        }

        impl $name {
            /// Every permitted value, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant ),+ ];

            /// The token stored in the database.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $token ),+
                }
            }

            /// The stored tokens of every permitted value.
            #[must_use]
            pub fn tokens() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::DomainError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $( $token => Ok(Self::$variant), )+
                    other => Err($crate::DomainError::UnknownVariant {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub mod error;
pub mod fund;
pub mod ids;
pub mod subscription;
pub mod transaction;
pub mod user;

pub use error::{DomainError, Result};
pub use fund::{default_funds, Fund, FundCategory};
pub use ids::{FundId, IdError, SubscriptionId, TransactionId, UserId};
pub use subscription::UserFundSubscription;
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use user::{NotificationPreference, Role, User, DEFAULT_CLIENT_BALANCE};
