//! In-process evaluation of a collection validator.
//!
//! Mirrors what the server's `$jsonSchema` check does for the subset of
//! keywords the schema uses: `required`, `bsonType` and `enum`. Fields that
//! are not declared are allowed.

use std::fmt;

use bson::{Bson, Document};

use crate::schema::{CollectionSchema, FieldType};

/// A single reason a document fails its collection's validator.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    /// A required field is absent.
    Missing(&'static str),

    /// A field has the wrong BSON type.
    WrongType {
        /// The field.
        field: &'static str,
        /// The declared `bsonType`.
        expected: &'static str,
        /// The type found.
        found: String,
    },

    /// A field's value is not one of the permitted values.
    NotInEnum {
        /// The field.
        field: &'static str,
        /// The offending value.
        value: Bson,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(field) => write!(f, "missing required field `{field}`"),
            Self::WrongType {
                field,
                expected,
                found,
            } => write!(f, "`{field}` must be {expected}, found {found}"),
            Self::NotInEnum { field, value } => {
                write!(f, "`{field}` has a value outside the permitted set: {value}")
            }
        }
    }
}

/// Collect every violation of `schema` in `document`.
#[must_use]
pub fn violations(schema: &CollectionSchema, document: &Document) -> Vec<Violation> {
    let mut found = Vec::new();

    for field in &schema.fields {
        let Some(value) = document.get(field.name) else {
            if field.required {
                found.push(Violation::Missing(field.name));
            }
            continue;
        };

        match &field.field_type {
            FieldType::Enum(allowed) => {
                let permitted = matches!(value, Bson::String(s) if allowed.contains(&s.as_str()));
                if !permitted {
                    found.push(Violation::NotInEnum {
                        field: field.name,
                        value: value.clone(),
                    });
                }
            }
            declared => {
                if !has_type(declared, value) {
                    found.push(Violation::WrongType {
                        field: field.name,
                        expected: declared.bson_type().unwrap_or_default(),
                        found: type_name(value).to_string(),
                    });
                }
            }
        }
    }

    found
}

/// Check a document against `schema`.
///
/// # Errors
///
/// Returns the violations, joined into one message, if the document fails.
pub fn check(schema: &CollectionSchema, document: &Document) -> Result<(), String> {
    let found = violations(schema, document);
    if found.is_empty() {
        return Ok(());
    }
    Err(found
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; "))
}

/// Check if a document satisfies `schema`.
#[must_use]
pub fn conforms(schema: &CollectionSchema, document: &Document) -> bool {
    violations(schema, document).is_empty()
}

fn has_type(declared: &FieldType, value: &Bson) -> bool {
    matches!(
        (declared, value),
        (FieldType::String, Bson::String(_))
            | (FieldType::Bool, Bson::Boolean(_))
            | (FieldType::Decimal, Bson::Decimal128(_))
            | (FieldType::Date, Bson::DateTime(_))
    )
}

/// The server's `bsonType` alias for a value.
fn type_name(value: &Bson) -> &'static str {
    match value {
        Bson::Double(_) => "double",
        Bson::String(_) => "string",
        Bson::Array(_) => "array",
        Bson::Document(_) => "object",
        Bson::Boolean(_) => "bool",
        Bson::Null => "null",
        Bson::RegularExpression(_) => "regex",
        Bson::JavaScriptCode(_) => "javascript",
        Bson::JavaScriptCodeWithScope(_) => "javascriptWithScope",
        Bson::Int32(_) => "int",
        Bson::Int64(_) => "long",
        Bson::Timestamp(_) => "timestamp",
        Bson::Binary(_) => "binData",
        Bson::ObjectId(_) => "objectId",
        Bson::DateTime(_) => "date",
        Bson::Symbol(_) => "symbol",
        Bson::Decimal128(_) => "decimal",
        Bson::Undefined => "undefined",
        Bson::MaxKey => "maxKey",
        Bson::MinKey => "minKey",
        Bson::DbPointer(_) => "dbPointer",
        #[allow(unreachable_patterns)]
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::to_decimal128;
    use crate::schema;
    use bson::doc;

    fn valid_user() -> Document {
        doc! {
            "email": "ana@example.com",
            "hashed_password": "$argon2id$hash",
            "full_name": "Ana",
            "role": "client",
            "is_active": true,
        }
    }

    #[test]
    fn complete_user_conforms() {
        assert!(conforms(&schema::users(), &valid_user()));
    }

    #[test]
    fn optional_fields_are_type_checked() {
        let mut user = valid_user();
        user.insert("current_balance", to_decimal128(500_000).unwrap());
        user.insert("created_at", bson::DateTime::now());
        user.insert("notification_preference", "sms");
        assert!(conforms(&schema::users(), &user));

        user.insert("current_balance", 500_000_i64);
        assert_eq!(
            violations(&schema::users(), &user),
            vec![Violation::WrongType {
                field: "current_balance",
                expected: "decimal",
                found: "long".into(),
            }]
        );
    }

    #[test]
    fn missing_email_is_reported() {
        let mut user = valid_user();
        user.remove("email");
        assert_eq!(
            violations(&schema::users(), &user),
            vec![Violation::Missing("email")]
        );
    }

    #[test]
    fn unknown_role_is_reported() {
        let mut user = valid_user();
        user.insert("role", "superadmin");
        let err = check(&schema::users(), &user).unwrap_err();
        assert!(err.contains("`role`"), "{err}");
    }

    #[test]
    fn enum_requires_string_value() {
        let mut user = valid_user();
        user.insert("role", 1);
        assert!(!conforms(&schema::users(), &user));
    }

    #[test]
    fn undeclared_fields_are_allowed() {
        let mut user = valid_user();
        user.insert("nickname", "ani");
        assert!(conforms(&schema::users(), &user));
    }

    #[test]
    fn every_violation_is_collected() {
        let found = violations(&schema::transactions(), &doc! { "type": "refund" });
        assert_eq!(found.len(), 4);
        assert!(found.contains(&Violation::Missing("user_id")));
        assert!(found.contains(&Violation::Missing("amount")));
        assert!(found.contains(&Violation::Missing("status")));
    }
}
