use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    models::{Account, CreateAccount},
};

/// Rows removed or anonymized while erasing one account.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EraseStats {
    /// Authored comments kept for thread integrity but stripped of their author.
    pub comments_anonymized: u64,
    pub chat_messages_deleted: u64,
    pub memberships_deleted: u64,
    pub hashtag_links_deleted: u64,
    pub notification_logs_deleted: u64,
}

impl EraseStats {
    /// Total related rows touched, excluding the account row itself.
    pub fn related_rows(&self) -> u64 {
        self.comments_anonymized
            + self.chat_messages_deleted
            + self.memberships_deleted
            + self.hashtag_links_deleted
            + self.notification_logs_deleted
    }
}

#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Create a new active account.
    async fn create(&self, input: CreateAccount) -> DbResult<Account>;

    /// Get an account by ID, withdrawn or not. Erased accounts have no row
    /// and return `None`.
    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Account>>;

    /// Set withdrawal timestamps on an active account.
    ///
    /// Guarded: only applies if the account is not already withdrawn, so a
    /// concurrent duplicate attempt cannot move an existing deadline.
    /// Returns `None` when the guard did not match (missing or already
    /// withdrawn row).
    async fn mark_withdrawn(
        &self,
        id: Uuid,
        deleted_at: DateTime<Utc>,
        permanent_deletion_date: DateTime<Utc>,
    ) -> DbResult<Option<Account>>;

    /// Clear withdrawal timestamps on a withdrawn account.
    ///
    /// Guarded: only applies while `permanent_deletion_date > now`; the
    /// restore cutoff is enforced in the write itself, not just by the
    /// caller's earlier read. Returns `None` when the guard did not match.
    async fn clear_withdrawal(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<Option<Account>>;

    /// Accounts whose grace period elapsed at or before `cutoff`, oldest
    /// deadline first, excluding the given ids. The same predicate every run
    /// is what gives failed erasures their retry; `exclude` lets a single run
    /// page past accounts it has already handled without shrinking its batch
    /// window.
    async fn find_erasable(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
        exclude: &[Uuid],
    ) -> DbResult<Vec<Account>>;

    /// Count of accounts erasable at `cutoff` (monitoring).
    async fn count_erasable(&self, cutoff: DateTime<Utc>) -> DbResult<i64>;

    /// Count of withdrawn accounts still inside their grace period (monitoring).
    async fn count_withdrawn(&self, now: DateTime<Utc>) -> DbResult<i64>;

    /// Irreversibly erase one account: clean up its related data and delete
    /// the account row, all in a single transaction. A failure rolls the
    /// whole unit back, leaving the account erasable for the next run.
    async fn erase(&self, id: Uuid) -> DbResult<EraseStats>;
}
