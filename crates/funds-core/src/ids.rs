//! Identifier types for the funds platform.
//!
//! Records reference each other by identifier strings; nothing enforces the
//! reference at the database level. These newtypes keep the strings
//! well-formed on the Rust side and stop a `FundId` from being passed where
//! a `UserId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// An identifier string that is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct IdError {
    /// The identifier type being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh random identifier.
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.hyphenated().fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, IdError> {
                Uuid::parse_str(s).map(Self).map_err(|_| IdError {
                    kind: stringify!($name),
                    value: s.to_string(),
                })
            }
        }
    };
}

record_id!(
    /// Identifies a user.
    UserId
);
record_id!(
    /// Identifies a fund.
    FundId
);
record_id!(
    /// Identifies a transaction.
    TransactionId
);
record_id!(
    /// Identifies a user's subscription to a fund.
    SubscriptionId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_form_parses_back() {
        let id = UserId::generate();
        assert_eq!(id.to_string().parse::<UserId>().unwrap(), id);
        assert_eq!(id.to_string().len(), 36);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = FundId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        assert_eq!(serde_json::from_str::<FundId>(&json).unwrap(), id);
    }

    #[test]
    fn malformed_input_names_the_type() {
        let err = "not-a-uuid".parse::<SubscriptionId>().unwrap_err();
        assert_eq!(err.kind, "SubscriptionId");
        assert_eq!(err.to_string(), "invalid SubscriptionId: \"not-a-uuid\"");
        assert!(serde_json::from_str::<TransactionId>("\"nope\"").is_err());
    }
}
