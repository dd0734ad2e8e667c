//! Collection, validator and index declarations.
//!
//! The schema is declared once as data. It is rendered to `$jsonSchema`
//! validators for the server and evaluated in-process by
//! [`crate::validate`], so both sides enforce the same rules.

use bson::{doc, Bson, Document};
use funds_core::{NotificationPreference, Role, TransactionStatus, TransactionType};

/// Collection names.
pub mod coll {
    /// Platform users, unique by `email`.
    pub const USERS: &str = "users";

    /// Investment funds.
    pub const FUNDS: &str = "funds";

    /// Subscription and cancellation records.
    pub const TRANSACTIONS: &str = "transactions";

    /// User positions in funds, unique by `(user_id, fund_id)`.
    pub const USER_FUND_SUBSCRIPTIONS: &str = "user_fund_subscriptions";
}

/// `validationLevel` attached with every validator.
pub const VALIDATION_LEVEL: &str = "strict";

/// `validationAction` attached with every validator.
pub const VALIDATION_ACTION: &str = "error";

/// Expected type of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// BSON `string`.
    String,
    /// BSON `bool`.
    Bool,
    /// BSON `decimal`.
    Decimal,
    /// BSON `date`.
    Date,
    /// One of a fixed set of string values. No `bsonType` is declared.
    Enum(Vec<&'static str>),
}

impl FieldType {
    /// The `bsonType` alias, if the field declares one.
    #[must_use]
    pub const fn bson_type(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Bool => Some("bool"),
            Self::Decimal => Some("decimal"),
            Self::Date => Some("date"),
            Self::Enum(_) => None,
        }
    }

    fn property(&self) -> Document {
        match self {
            Self::Enum(values) => doc! { "enum": values.clone() },
            other => doc! { "bsonType": other.bson_type().unwrap_or_default() },
        }
    }
}

/// A declared field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name.
    pub name: &'static str,
    /// Expected type.
    pub field_type: FieldType,
    /// Whether the field must be present.
    pub required: bool,
}

impl FieldSpec {
    const fn required(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: true,
        }
    }

    const fn optional(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            required: false,
        }
    }
}

/// Index key direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending (`1`).
    Ascending,
    /// Descending (`-1`).
    Descending,
}

impl SortOrder {
    /// The numeric key value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::Ascending => 1,
            Self::Descending => -1,
        }
    }

    /// Parse a key value as returned by the server.
    ///
    /// Numbers may come back as any BSON numeric type. Special index types
    /// (`"text"`, `"2dsphere"`, ...) are not sort orders.
    #[must_use]
    pub fn from_bson(value: &Bson) -> Option<Self> {
        let sign = match value {
            Bson::Int32(n) => i64::from(*n).signum(),
            Bson::Int64(n) => n.signum(),
            Bson::Double(n) if *n > 0.0 => 1,
            Bson::Double(n) if *n < 0.0 => -1,
            _ => 0,
        };
        match sign {
            1 => Some(Self::Ascending),
            -1 => Some(Self::Descending),
            _ => None,
        }
    }
}

/// A declared index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    /// Keys in order.
    pub keys: Vec<(String, SortOrder)>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
}

impl IndexSpec {
    /// Single-field ascending index.
    #[must_use]
    pub fn ascending(field: &str) -> Self {
        Self {
            keys: vec![(field.to_string(), SortOrder::Ascending)],
            unique: false,
        }
    }

    /// Single-field descending index.
    #[must_use]
    pub fn descending(field: &str) -> Self {
        Self {
            keys: vec![(field.to_string(), SortOrder::Descending)],
            unique: false,
        }
    }

    /// Compound index over the given keys.
    #[must_use]
    pub fn compound(keys: &[(&str, SortOrder)]) -> Self {
        Self {
            keys: keys
                .iter()
                .map(|(field, order)| ((*field).to_string(), *order))
                .collect(),
            unique: false,
        }
    }

    /// Make the index unique.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Index name, using the server's default `<field>_<order>` convention.
    #[must_use]
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, order)| format!("{field}_{}", order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }

    /// The key document, e.g. `{ user_id: 1, fund_id: 1 }`.
    #[must_use]
    pub fn key_document(&self) -> Document {
        self.keys
            .iter()
            .map(|(field, order)| (field.clone(), Bson::Int32(order.as_i32())))
            .collect()
    }

    /// Field names in key order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(field, _)| field.as_str())
    }
}

/// A declared collection with its validator and indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    /// Collection name.
    pub name: &'static str,
    /// Declared fields, in validator property order.
    pub fields: Vec<FieldSpec>,
    /// Declared secondary indexes.
    pub indexes: Vec<IndexSpec>,
}

impl CollectionSchema {
    /// Names of the required fields, in declaration order.
    pub fn required(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.required).map(|f| f.name)
    }

    /// Look up a declared field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The `$jsonSchema` body.
    #[must_use]
    pub fn json_schema(&self) -> Document {
        let properties: Document = self
            .fields
            .iter()
            .map(|f| (f.name.to_string(), Bson::Document(f.field_type.property())))
            .collect();

        doc! {
            "bsonType": "object",
            "required": self.required().collect::<Vec<_>>(),
            "properties": properties,
        }
    }

    /// The collection validator, `{ $jsonSchema: ... }`.
    ///
    /// Also usable as a query filter matching conforming documents.
    #[must_use]
    pub fn validator(&self) -> Document {
        doc! { "$jsonSchema": self.json_schema() }
    }
}

/// The `users` collection.
#[must_use]
pub fn users() -> CollectionSchema {
    use FieldType::{Bool, Date, Decimal, Enum, String};

    CollectionSchema {
        name: coll::USERS,
        fields: vec![
            FieldSpec::required("email", String),
            FieldSpec::required("hashed_password", String),
            FieldSpec::required("full_name", String),
            FieldSpec::optional("phone_number", String),
            FieldSpec::required("role", Enum(Role::tokens())),
            FieldSpec::required("is_active", Bool),
            FieldSpec::optional("current_balance", Decimal),
            FieldSpec::optional(
                "notification_preference",
                Enum(NotificationPreference::tokens()),
            ),
            FieldSpec::optional("created_at", Date),
            FieldSpec::optional("updated_at", Date),
        ],
        indexes: vec![
            IndexSpec::ascending("email").unique(),
            IndexSpec::ascending("role"),
            IndexSpec::ascending("is_active"),
        ],
    }
}

/// The `funds` collection.
#[must_use]
pub fn funds() -> CollectionSchema {
    use FieldType::{Bool, Date, Decimal, String};

    CollectionSchema {
        name: coll::FUNDS,
        fields: vec![
            FieldSpec::required("name", String),
            FieldSpec::optional("description", String),
            FieldSpec::required("category", String),
            FieldSpec::required("minimum_amount", Decimal),
            FieldSpec::optional("is_active", Bool),
            FieldSpec::optional("created_at", Date),
        ],
        indexes: vec![
            IndexSpec::ascending("name"),
            IndexSpec::ascending("category"),
            IndexSpec::ascending("is_active"),
        ],
    }
}

/// The `transactions` collection.
#[must_use]
pub fn transactions() -> CollectionSchema {
    use FieldType::{Date, Decimal, Enum, String};

    CollectionSchema {
        name: coll::TRANSACTIONS,
        fields: vec![
            FieldSpec::required("user_id", String),
            FieldSpec::optional("fund_id", String),
            FieldSpec::optional("subscription_id", String),
            FieldSpec::required("type", Enum(TransactionType::tokens())),
            FieldSpec::required("amount", Decimal),
            FieldSpec::required("status", Enum(TransactionStatus::tokens())),
            FieldSpec::optional("description", String),
            FieldSpec::optional("created_at", Date),
            FieldSpec::optional("processed_at", Date),
        ],
        indexes: vec![
            IndexSpec::ascending("user_id"),
            IndexSpec::ascending("fund_id"),
            IndexSpec::ascending("type"),
            IndexSpec::ascending("status"),
            IndexSpec::descending("created_at"),
        ],
    }
}

/// The `user_fund_subscriptions` collection.
#[must_use]
pub fn user_fund_subscriptions() -> CollectionSchema {
    use FieldType::{Bool, Date, Decimal, String};

    CollectionSchema {
        name: coll::USER_FUND_SUBSCRIPTIONS,
        fields: vec![
            FieldSpec::required("user_id", String),
            FieldSpec::required("fund_id", String),
            FieldSpec::required("amount", Decimal),
            FieldSpec::required("is_active", Bool),
            FieldSpec::optional("subscribed_at", Date),
            FieldSpec::optional("cancelled_at", Date),
        ],
        indexes: vec![
            IndexSpec::ascending("user_id"),
            IndexSpec::ascending("fund_id"),
            IndexSpec::compound(&[
                ("user_id", SortOrder::Ascending),
                ("fund_id", SortOrder::Ascending),
            ])
            .unique(),
            IndexSpec::ascending("is_active"),
        ],
    }
}

/// Every collection, in initialization order.
#[must_use]
pub fn all_collections() -> Vec<CollectionSchema> {
    vec![users(), funds(), transactions(), user_fund_subscriptions()]
}

/// Look up a declared collection by name.
#[must_use]
pub fn collection(name: &str) -> Option<CollectionSchema> {
    all_collections().into_iter().find(|c| c.name == name)
}
