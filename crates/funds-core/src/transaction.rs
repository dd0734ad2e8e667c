//! Transaction types.
//!
//! Every subscription to or cancellation of a fund leaves a transaction
//! record in the history collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FundId, SubscriptionId, TransactionId, UserId};

token_enum! {
    /// Kind of fund movement.
    TransactionType, "type" {
        /// Money moved into a fund.
        Subscription => "subscription",
        /// Money returned from a fund.
        Cancellation => "cancellation",
    }
}

token_enum! {
    /// Processing state of a transaction.
    TransactionStatus, "status" {
        /// Recorded, not yet processed.
        Pending => "pending",
        /// Processed successfully.
        Completed => "completed",
        /// Processing failed.
        Failed => "failed",
    }
}

/// A fund transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,

    /// The user who made the transaction.
    pub user_id: UserId,

    /// The fund involved.
    pub fund_id: Option<FundId>,

    /// The subscription opened or closed by this transaction.
    pub subscription_id: Option<SubscriptionId>,

    /// Kind of movement.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,

    /// Amount in COP, always positive.
    pub amount: i64,

    /// Processing state.
    pub status: TransactionStatus,

    /// Human-readable description.
    pub description: Option<String>,

    /// When the transaction was recorded.
    pub created_at: DateTime<Utc>,

    /// When the transaction left the pending state.
    pub processed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// A pending transaction recorded now.
    #[must_use]
    pub fn new(user_id: UserId, transaction_type: TransactionType, amount: i64) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            fund_id: None,
            subscription_id: None,
            transaction_type,
            amount,
            status: TransactionStatus::Pending,
            description: None,
            created_at: Utc::now(),
            processed_at: None,
        }
    }

    /// Set the fund and subscription the transaction moves money for.
    #[must_use]
    pub fn for_subscription(mut self, fund_id: FundId, subscription_id: SubscriptionId) -> Self {
        self.fund_id = Some(fund_id);
        self.subscription_id = Some(subscription_id);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
