use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::Deletable;

/// A user account with the extended withdrawal lifecycle.
///
/// Unlike content entities, an account that is soft-deleted (withdrawn) also
/// carries `permanent_deletion_date`, the wall-clock deadline after which
/// the cleanup job may erase it physically. Status (`Active` / `Withdrawn` /
/// `Erasable`) is always derived from these two fields against the current
/// time, never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    /// Set when the account withdraws; cleared on restore.
    pub deleted_at: Option<DateTime<Utc>>,
    /// `deleted_at + grace period`, fixed at the moment of withdrawal.
    pub permanent_deletion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Email with the local part redacted, safe for log output.
    ///
    /// Keeps the first character of the local part: `alice@example.com`
    /// becomes `a***@example.com`.
    pub fn masked_email(&self) -> String {
        mask_email(&self.email)
    }
}

impl Deletable for Account {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccount {
    pub email: String,
    pub display_name: String,
}

/// Redact the local part of an email address for logging.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        _ => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("alice@example.com"), "a***@example.com");
        assert_eq!(mask_email("b@huddle.app"), "b***@huddle.app");
    }

    #[test]
    fn test_mask_email_malformed() {
        assert_eq!(mask_email("not-an-email"), "***");
        assert_eq!(mask_email("@example.com"), "***");
        assert_eq!(mask_email(""), "***");
    }
}
