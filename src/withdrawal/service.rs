use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{AccountStatus, WithdrawalError, remaining_days, restore, status, withdraw};
use crate::{db::DbPool, models::Account};

/// Persistence-backed entry points for the account withdrawal lifecycle.
///
/// The pure transitions in [`crate::withdrawal`] decide validity; the repo
/// writes are guarded with the same preconditions in SQL, so a concurrent
/// second attempt on the same account degrades to a rejection instead of a
/// double transition.
pub struct AccountService {
    db: Arc<DbPool>,
    grace_period_days: i64,
}

impl AccountService {
    pub fn new(db: Arc<DbPool>, grace_period_days: i64) -> Self {
        Self {
            db,
            grace_period_days,
        }
    }

    /// Withdraw an account at `now`, starting its grace period.
    pub async fn withdraw(&self, id: Uuid, now: DateTime<Utc>) -> Result<Account, WithdrawalError> {
        let mut account = self
            .db
            .accounts()
            .get_by_id(id)
            .await?
            .ok_or(WithdrawalError::NotFound(id))?;

        let deadline = withdraw(&mut account, now, self.grace_period_days)?;

        let updated = self
            .db
            .accounts()
            .mark_withdrawn(id, now, deadline)
            .await?
            .ok_or(WithdrawalError::AlreadyWithdrawn(id))?;

        tracing::info!(
            account_id = %id,
            email = %updated.masked_email(),
            permanent_deletion_date = %deadline,
            "Account withdrawn"
        );
        Ok(updated)
    }

    /// Restore a withdrawn account, valid strictly before its deadline.
    pub async fn restore(&self, id: Uuid, now: DateTime<Utc>) -> Result<Account, WithdrawalError> {
        let mut account = self
            .db
            .accounts()
            .get_by_id(id)
            .await?
            .ok_or(WithdrawalError::NotFound(id))?;

        // Restoring an account that was never withdrawn is a no-op.
        if account.deleted_at.is_none() {
            return Ok(account);
        }

        let deadline = account.permanent_deletion_date.unwrap_or(now);
        restore(&mut account, now)?;
        let updated = self
            .db
            .accounts()
            .clear_withdrawal(id, now)
            .await?
            .ok_or(WithdrawalError::RestoreWindowClosed { id, deadline })?;

        tracing::info!(
            account_id = %id,
            email = %updated.masked_email(),
            "Account restored within grace period"
        );
        Ok(updated)
    }

    /// Whole days left in the grace period, never negative.
    pub async fn remaining_days(&self, id: Uuid, now: DateTime<Utc>) -> Result<i64, WithdrawalError> {
        let account = self
            .db
            .accounts()
            .get_by_id(id)
            .await?
            .ok_or(WithdrawalError::NotFound(id))?;
        Ok(remaining_days(&account, now))
    }

    /// Derived status of an account at `now`.
    pub async fn status(&self, id: Uuid, now: DateTime<Utc>) -> Result<AccountStatus, WithdrawalError> {
        let account = self
            .db
            .accounts()
            .get_by_id(id)
            .await?
            .ok_or(WithdrawalError::NotFound(id))?;
        Ok(status(&account, now))
    }
}
