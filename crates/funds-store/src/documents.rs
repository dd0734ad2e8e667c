//! Mapping of domain records to stored documents.
//!
//! Field names follow the collection declarations in [`crate::schema`].
//! Identifiers are stored as strings, amounts as `decimal`, timestamps as
//! BSON dates. Optional fields are omitted rather than stored as `null`,
//! since the validators only accept the declared type.

use bson::{doc, Document};
use chrono::{DateTime, Utc};
use funds_core::{Fund, Transaction, User, UserFundSubscription};

use crate::decimal::to_decimal128;
use crate::error::Result;
use crate::schema::coll;

/// A record that maps to a document in one collection.
pub trait ToDocument {
    /// The collection the record is stored in.
    const COLLECTION: &'static str;

    /// Build the stored document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Decimal` if an amount cannot be encoded.
    fn to_document(&self) -> Result<Document>;
}

fn date(value: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_chrono(value)
}

impl ToDocument for User {
    const COLLECTION: &'static str = coll::USERS;

    fn to_document(&self) -> Result<Document> {
        let mut document = doc! {
            "_id": self.id.to_string(),
            "email": self.email.as_str(),
            "hashed_password": self.hashed_password.as_str(),
            "full_name": self.full_name.as_str(),
            "role": self.role.as_str(),
            "is_active": self.is_active,
            "current_balance": to_decimal128(self.current_balance)?,
            "notification_preference": self.notification_preference.as_str(),
            "created_at": date(self.created_at),
            "updated_at": date(self.updated_at),
        };
        if let Some(phone) = &self.phone_number {
            document.insert("phone_number", phone.as_str());
        }
        Ok(document)
    }
}

impl ToDocument for Fund {
    const COLLECTION: &'static str = coll::FUNDS;

    fn to_document(&self) -> Result<Document> {
        let mut document = doc! {
            "_id": self.id.to_string(),
            "name": self.name.as_str(),
            "category": self.category.as_str(),
            "minimum_amount": to_decimal128(self.minimum_amount)?,
            "is_active": self.is_active,
            "created_at": date(self.created_at),
        };
        if let Some(description) = &self.description {
            document.insert("description", description.as_str());
        }
        Ok(document)
    }
}

impl ToDocument for Transaction {
    const COLLECTION: &'static str = coll::TRANSACTIONS;

    fn to_document(&self) -> Result<Document> {
        let mut document = doc! {
            "_id": self.id.to_string(),
            "user_id": self.user_id.to_string(),
            "type": self.transaction_type.as_str(),
            "amount": to_decimal128(self.amount)?,
            "status": self.status.as_str(),
            "created_at": date(self.created_at),
        };
        if let Some(fund_id) = self.fund_id {
            document.insert("fund_id", fund_id.to_string());
        }
        if let Some(subscription_id) = self.subscription_id {
            document.insert("subscription_id", subscription_id.to_string());
        }
        if let Some(description) = &self.description {
            document.insert("description", description.as_str());
        }
        if let Some(processed_at) = self.processed_at {
            document.insert("processed_at", date(processed_at));
        }
        Ok(document)
    }
}

impl ToDocument for UserFundSubscription {
    const COLLECTION: &'static str = coll::USER_FUND_SUBSCRIPTIONS;

    fn to_document(&self) -> Result<Document> {
        let mut document = doc! {
            "_id": self.id.to_string(),
            "user_id": self.user_id.to_string(),
            "fund_id": self.fund_id.to_string(),
            "amount": to_decimal128(self.amount)?,
            "is_active": self.is_active,
            "subscribed_at": date(self.subscribed_at),
        };
        if let Some(cancelled_at) = self.cancelled_at {
            document.insert("cancelled_at", date(cancelled_at));
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use crate::validate::{conforms, violations};
    use funds_core::{default_funds, FundId, Role, SubscriptionId, TransactionType, UserId};

    #[test]
    fn user_document_conforms() {
        let user = User::new("ana@example.com", "hash", "Ana")
            .unwrap()
            .with_role(Role::Admin)
            .with_sms("+573001112233");
        let document = user.to_document().unwrap();

        assert!(conforms(&schema::users(), &document));
        assert_eq!(document.get_str("role").unwrap(), "admin");
        assert_eq!(document.get_str("phone_number").unwrap(), "+573001112233");
        assert_eq!(
            document.get_decimal128("current_balance").unwrap().to_string(),
            "500000"
        );
    }

    #[test]
    fn fund_documents_conform() {
        for fund in default_funds() {
            let document = fund.to_document().unwrap();
            assert!(
                conforms(&schema::funds(), &document),
                "{:?}",
                violations(&schema::funds(), &document)
            );
            assert_eq!(document.get_str("category").unwrap(), fund.category.as_str());
        }
    }

    #[test]
    fn pending_transaction_omits_processed_at() {
        let tx = Transaction::new(UserId::generate(), TransactionType::Subscription, 75_000)
            .for_subscription(FundId::generate(), SubscriptionId::generate());
        let document = tx.to_document().unwrap();

        assert!(conforms(&schema::transactions(), &document));
        assert!(!document.contains_key("processed_at"));
        assert_eq!(document.get_str("type").unwrap(), "subscription");
        assert_eq!(Transaction::COLLECTION, "transactions");
    }

    #[test]
    fn cancelled_subscription_keeps_cancelled_at() {
        let fund = default_funds().remove(0);
        let mut sub = UserFundSubscription::new(UserId::generate(), fund.id, 80_000);
        sub.is_active = false;
        sub.cancelled_at = Some(Utc::now());
        let document = sub.to_document().unwrap();

        assert!(conforms(&schema::user_fund_subscriptions(), &document));
        assert!(!document.get_bool("is_active").unwrap());
        assert!(document.get_datetime("cancelled_at").is_ok());
        assert_eq!(document.get_str("fund_id").unwrap(), fund.id.to_string());
    }
}
