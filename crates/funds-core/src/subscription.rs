//! User-to-fund subscriptions.
//!
//! A user holds at most one subscription per fund; the pair is unique in
//! storage. A cancelled subscription keeps its record with `is_active`
//! cleared and `cancelled_at` set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{FundId, SubscriptionId, UserId};

/// A user's position in a fund.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFundSubscription {
    /// Unique identifier.
    pub id: SubscriptionId,

    /// The subscribed user.
    pub user_id: UserId,

    /// The fund.
    pub fund_id: FundId,

    /// Subscribed amount in COP.
    pub amount: i64,

    /// Whether the subscription is open.
    pub is_active: bool,

    /// When the subscription was opened.
    pub subscribed_at: DateTime<Utc>,

    /// When the subscription was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl UserFundSubscription {
    /// An open subscription starting now.
    #[must_use]
    pub fn new(user_id: UserId, fund_id: FundId, amount: i64) -> Self {
        Self {
            id: SubscriptionId::generate(),
            user_id,
            fund_id,
            amount,
            is_active: true,
            subscribed_at: Utc::now(),
            cancelled_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_subscription_is_open() {
        let fund_id = FundId::generate();
        let sub = UserFundSubscription::new(UserId::generate(), fund_id, 300_000);

        assert!(sub.is_active);
        assert_eq!(sub.fund_id, fund_id);
        assert!(sub.cancelled_at.is_none());
    }
}
