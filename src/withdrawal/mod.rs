//! Account withdrawal state machine.
//!
//! States: `Active → Withdrawn → Erasable → erased`. Withdrawal fixes the
//! permanent deletion deadline at `deleted_at + grace period`; restore is
//! allowed strictly before that deadline, and the boundary itself is
//! inclusive on the erasable side (`permanent_deletion_date <= now` means
//! the account may be erased and can no longer be restored). Status is
//! always derived from the two timestamps against an injected `now`, never
//! stored, so it cannot drift.

mod service;

pub use service::AccountService;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::{db::DbError, lifecycle::Deletable, models::Account};

#[derive(Debug, Error)]
pub enum WithdrawalError {
    #[error("account {0} not found")]
    NotFound(Uuid),

    #[error("account {0} is already withdrawn")]
    AlreadyWithdrawn(Uuid),

    #[error("restore window for account {id} closed at {deadline}")]
    RestoreWindowClosed {
        id: Uuid,
        deadline: DateTime<Utc>,
    },

    #[error("database error: {0}")]
    Db(#[from] DbError),
}

/// Derived account status. There is no `Erased` variant: an erased account
/// has no row, so it is simply not observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Withdrawn,
    Erasable,
}

/// Compute the status of an account at `now`.
pub fn status(account: &Account, now: DateTime<Utc>) -> AccountStatus {
    if account.is_active() {
        return AccountStatus::Active;
    }
    match account.permanent_deletion_date {
        Some(deadline) if deadline <= now => AccountStatus::Erasable,
        _ => AccountStatus::Withdrawn,
    }
}

/// Deadline an account withdrawn at `now` would be erasable at.
pub fn withdrawal_deadline(now: DateTime<Utc>, grace_period_days: i64) -> DateTime<Utc> {
    now + Duration::days(grace_period_days)
}

/// Transition `Active → Withdrawn`, returning the deadline that was set.
///
/// Rejected without state change if the account is already withdrawn. The
/// deadline is fixed here, with the grace period in effect at this moment;
/// later configuration changes do not move it.
pub fn withdraw(
    account: &mut Account,
    now: DateTime<Utc>,
    grace_period_days: i64,
) -> Result<DateTime<Utc>, WithdrawalError> {
    if !account.is_active() {
        return Err(WithdrawalError::AlreadyWithdrawn(account.id));
    }
    let deadline = withdrawal_deadline(now, grace_period_days);
    account.mark_deleted(now);
    account.permanent_deletion_date = Some(deadline);
    Ok(deadline)
}

/// Transition `Withdrawn → Active`.
///
/// A no-op on an account that is already active. Rejected once the deadline
/// has passed; at `now == permanent_deletion_date` the account is erasable
/// and restoration is no longer offered.
pub fn restore(account: &mut Account, now: DateTime<Utc>) -> Result<(), WithdrawalError> {
    match status(account, now) {
        AccountStatus::Active => Ok(()),
        AccountStatus::Withdrawn => {
            account.restore();
            account.permanent_deletion_date = None;
            Ok(())
        }
        AccountStatus::Erasable => Err(WithdrawalError::RestoreWindowClosed {
            id: account.id,
            deadline: account.permanent_deletion_date.unwrap_or(now),
        }),
    }
}

/// Whole days remaining until the deadline, floored at zero so callers can
/// render "N days remaining" without special-casing expiry.
pub fn remaining_days(account: &Account, now: DateTime<Utc>) -> i64 {
    match account.permanent_deletion_date {
        Some(deadline) => (deadline - now).num_days().max(0),
        None => 0,
    }
}
