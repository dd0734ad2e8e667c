//! User types.
//!
//! A user is either an administrator or a client who subscribes to funds.
//! Credentials arrive already hashed; this crate never sees a plain password.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::UserId;

/// Opening balance granted to new clients, in COP.
pub const DEFAULT_CLIENT_BALANCE: i64 = 500_000;

token_enum! {
    /// Access role of a user.
    Role, "role" {
        /// Full access to the platform.
        Admin => "admin",
        /// Fund operations and queries on their own account.
        Client => "client",
    }
}

token_enum! {
    /// Channel used to notify a user about subscriptions and cancellations.
    NotificationPreference, "notification_preference" {
        /// Notify by email.
        Email => "email",
        /// Notify by SMS.
        Sms => "sms",
    }
}

/// A platform user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: UserId,

    /// Login email, unique across all users.
    pub email: String,

    /// Password hash produced by the authentication layer.
    pub hashed_password: String,

    /// Display name.
    pub full_name: String,

    /// Contact phone, used for SMS notifications.
    pub phone_number: Option<String>,

    /// Access role.
    pub role: Role,

    /// Whether the account may log in.
    pub is_active: bool,

    /// Available balance in COP.
    pub current_balance: i64,

    /// Notification channel.
    pub notification_preference: NotificationPreference,

    /// When the user was created.
    pub created_at: DateTime<Utc>,

    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create an active client with the default opening balance.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyField` if the email, hash or name is blank.
    pub fn new(
        email: impl Into<String>,
        hashed_password: impl Into<String>,
        full_name: impl Into<String>,
    ) -> Result<Self> {
        let email = email.into().trim().to_lowercase();
        let hashed_password = hashed_password.into();
        let full_name = full_name.into();

        if email.is_empty() {
            return Err(DomainError::EmptyField("email"));
        }
        if hashed_password.is_empty() {
            return Err(DomainError::EmptyField("hashed_password"));
        }
        if full_name.trim().is_empty() {
            return Err(DomainError::EmptyField("full_name"));
        }

        let now = Utc::now();
        Ok(Self {
            id: UserId::generate(),
            email,
            hashed_password,
            full_name,
            phone_number: None,
            role: Role::Client,
            is_active: true,
            current_balance: DEFAULT_CLIENT_BALANCE,
            notification_preference: NotificationPreference::Email,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set the role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Set the phone number and switch notifications to SMS.
    #[must_use]
    pub fn with_sms(mut self, phone_number: impl Into<String>) -> Self {
        self.phone_number = Some(phone_number.into());
        self.notification_preference = NotificationPreference::Sms;
        self
    }

    /// Check if the user has administrative access.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_is_active_client() {
        let user = User::new(" Ana@Example.com ", "$argon2id$hash", "Ana").unwrap();

        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.role, Role::Client);
        assert!(user.is_active);
        assert!(!user.is_admin());
        assert_eq!(user.current_balance, DEFAULT_CLIENT_BALANCE);
        assert_eq!(user.notification_preference, NotificationPreference::Email);
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert!(matches!(
            User::new("", "h", "n"),
            Err(DomainError::EmptyField("email"))
        ));
        assert!(matches!(
            User::new("a@b.co", "", "n"),
            Err(DomainError::EmptyField("hashed_password"))
        ));
        assert!(matches!(
            User::new("a@b.co", "h", "  "),
            Err(DomainError::EmptyField("full_name"))
        ));
    }

    #[test]
    fn sms_preference_carries_phone() {
        let user = User::new("a@b.co", "h", "n").unwrap().with_sms("+573001112233");
        assert_eq!(user.notification_preference, NotificationPreference::Sms);
        assert_eq!(user.phone_number.as_deref(), Some("+573001112233"));
    }

    #[test]
    fn role_tokens() {
        assert_eq!(Role::tokens(), vec!["admin", "client"]);
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert!(matches!(
            "superadmin".parse::<Role>(),
            Err(DomainError::UnknownVariant { kind: "role", .. })
        ));
    }

    #[test]
    fn role_serializes_as_token() {
        assert_eq!(serde_json::to_string(&Role::Client).unwrap(), "\"client\"");
    }
}
