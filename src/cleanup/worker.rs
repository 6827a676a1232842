use std::{collections::HashSet, sync::Arc, time::Instant};

use chrono::{DateTime, Utc};

use crate::{
    config::CleanupConfig,
    db::{DbPool, DbResult},
    observability::metrics,
};

/// Results from a single cleanup run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanupRunResult {
    /// Accounts irreversibly erased.
    pub accounts_erased: u64,
    /// Accounts that failed and were skipped; they stay erasable and are
    /// retried by the next run's query.
    pub accounts_failed: u64,
    /// Authored comments stripped of their author link.
    pub comments_anonymized: u64,
    pub chat_messages_deleted: u64,
    pub memberships_deleted: u64,
    pub hashtag_links_deleted: u64,
    pub notification_logs_deleted: u64,
    /// Duration of the run in milliseconds.
    pub duration_ms: u64,
}

impl CleanupRunResult {
    /// Check if any accounts were erased.
    pub fn has_erasures(&self) -> bool {
        self.accounts_erased > 0
    }

    /// Total related rows touched across all accounts.
    pub fn related_rows(&self) -> u64 {
        self.comments_anonymized
            + self.chat_messages_deleted
            + self.memberships_deleted
            + self.hashtag_links_deleted
            + self.notification_logs_deleted
    }
}

/// Read-only view of accounts waiting in the withdrawal pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCounts {
    /// Withdrawn, still inside the grace period.
    pub withdrawn: i64,
    /// Grace period elapsed, awaiting erasure.
    pub erasable: i64,
}

/// Starts the cleanup worker as a background task.
///
/// The worker runs in a loop, erasing expired accounts at the configured
/// interval. It will run indefinitely until the task is cancelled.
pub async fn start_cleanup_worker(db: Arc<DbPool>, config: CleanupConfig) {
    if !config.enabled {
        tracing::info!("Cleanup worker disabled by configuration");
        return;
    }

    let dry_run_msg = if config.safety.dry_run {
        " (DRY RUN)"
    } else {
        ""
    };

    tracing::info!(
        interval_hours = config.interval_hours,
        grace_period_days = config.grace_period_days,
        max_erasures_per_run = config.safety.max_erasures_per_run,
        batch_size = config.safety.batch_size,
        dry_run = config.safety.dry_run,
        "Starting cleanup worker{}",
        dry_run_msg
    );

    let interval = config.interval();

    loop {
        match run_cleanup(&db, &config, Utc::now()).await {
            Ok(result) => {
                if result.has_erasures() || result.accounts_failed > 0 {
                    tracing::info!(
                        accounts_erased = result.accounts_erased,
                        accounts_failed = result.accounts_failed,
                        related_rows = result.related_rows(),
                        duration_ms = result.duration_ms,
                        dry_run = config.safety.dry_run,
                        "Cleanup run complete{}",
                        dry_run_msg
                    );
                } else {
                    tracing::debug!("Cleanup run complete, no accounts to erase");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Error running cleanup");
            }
        }

        tokio::time::sleep(interval).await;
    }
}

/// Run a single cleanup pass at `now`, erasing every account whose grace
/// period has elapsed.
///
/// `now` is injected rather than read from the wall clock so schedules can
/// be simulated deterministically.
pub async fn run_cleanup(
    db: &Arc<DbPool>,
    config: &CleanupConfig,
    now: DateTime<Utc>,
) -> DbResult<CleanupRunResult> {
    erase_batch(db, config, now).await
}

/// Operator-triggered bulk erasure of every account whose deadline is before
/// an arbitrary `cutoff`. Same per-account isolation and irreversibility
/// rules as the scheduled run.
pub async fn purge_before(
    db: &Arc<DbPool>,
    config: &CleanupConfig,
    cutoff: DateTime<Utc>,
) -> DbResult<CleanupRunResult> {
    tracing::info!(cutoff = %cutoff, "Manual purge requested");
    erase_batch(db, config, cutoff).await
}

/// Counts of withdrawn and erasable accounts at `now`, for monitoring.
pub async fn pending_counts(db: &Arc<DbPool>, now: DateTime<Utc>) -> DbResult<PendingCounts> {
    let accounts = db.accounts();
    Ok(PendingCounts {
        withdrawn: accounts.count_withdrawn(now).await?,
        erasable: accounts.count_erasable(now).await?,
    })
}

/// Erase accounts whose deadline is at or before `cutoff`.
///
/// Fetches erasable accounts in deadline order and erases each as its own
/// unit of work. Accounts that fail (or are only counted under dry-run) are
/// excluded from every later fetch in this run, so a failing account at the
/// head of the deadline order never pins the batch window on itself; it is
/// retried on the next scheduled run instead.
async fn erase_batch(
    db: &Arc<DbPool>,
    config: &CleanupConfig,
    cutoff: DateTime<Utc>,
) -> DbResult<CleanupRunResult> {
    let start = Instant::now();
    let mut result = CleanupRunResult::default();

    let max_erasures = if config.safety.max_erasures_per_run == 0 {
        u64::MAX
    } else {
        config.safety.max_erasures_per_run
    };

    let mut skipped: HashSet<uuid::Uuid> = HashSet::new();

    'runs: loop {
        let exclude: Vec<uuid::Uuid> = skipped.iter().copied().collect();
        let batch = db
            .accounts()
            .find_erasable(cutoff, config.safety.batch_size as i64, &exclude)
            .await?;
        if batch.is_empty() {
            break;
        }

        for account in batch {
            if result.accounts_erased >= max_erasures {
                tracing::info!(
                    accounts_erased = result.accounts_erased,
                    "Max erasures per run reached, stopping early"
                );
                break 'runs;
            }

            if config.safety.dry_run {
                tracing::info!(
                    account_id = %account.id,
                    email = %account.masked_email(),
                    permanent_deletion_date = ?account.permanent_deletion_date,
                    "DRY RUN: Would erase account and its related data"
                );
                skipped.insert(account.id);
                result.accounts_erased += 1;
                continue;
            }

            match db.accounts().erase(account.id).await {
                Ok(stats) => {
                    result.accounts_erased += 1;
                    result.comments_anonymized += stats.comments_anonymized;
                    result.chat_messages_deleted += stats.chat_messages_deleted;
                    result.memberships_deleted += stats.memberships_deleted;
                    result.hashtag_links_deleted += stats.hashtag_links_deleted;
                    result.notification_logs_deleted += stats.notification_logs_deleted;
                    tracing::debug!(
                        account_id = %account.id,
                        email = %account.masked_email(),
                        related_rows = stats.related_rows(),
                        "Erased account"
                    );
                }
                Err(e) => {
                    // Isolated: the unit of work rolled back, the account
                    // stays erasable, and the run moves on.
                    result.accounts_failed += 1;
                    skipped.insert(account.id);
                    metrics::record_erasure_error();
                    tracing::error!(
                        account_id = %account.id,
                        email = %account.masked_email(),
                        error = %e,
                        "Failed to erase account, skipping until next run"
                    );
                }
            }
        }
    }

    result.duration_ms = start.elapsed().as_millis() as u64;
    if result.accounts_erased > 0 && !config.safety.dry_run {
        metrics::record_accounts_erased(result.accounts_erased);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    use super::*;
    use crate::{
        db::tests::harness::{create_sqlite_pool, run_sqlite_migrations},
        models::CreateAccount,
    };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
    }

    fn config() -> CleanupConfig {
        CleanupConfig {
            enabled: true,
            ..Default::default()
        }
    }

    async fn setup() -> (sqlx::SqlitePool, Arc<DbPool>) {
        let pool = create_sqlite_pool().await;
        run_sqlite_migrations(&pool).await;
        let db = Arc::new(DbPool::from_sqlite(pool.clone()));
        (pool, db)
    }

    /// Create an account already withdrawn at `withdrawn_at` with the given
    /// grace period.
    async fn withdrawn_account(db: &Arc<DbPool>, withdrawn_at: DateTime<Utc>, grace_days: i64) -> Uuid {
        let account = db
            .accounts()
            .create(CreateAccount {
                email: "gone@example.com".to_string(),
                display_name: "Gone".to_string(),
            })
            .await
            .unwrap();
        db.accounts()
            .mark_withdrawn(
                account.id,
                withdrawn_at,
                withdrawn_at + Duration::days(grace_days),
            )
            .await
            .unwrap()
            .unwrap();
        account.id
    }

    #[tokio::test]
    async fn test_run_before_any_deadline_erases_nothing() {
        let (_pool, db) = setup().await;
        let id = withdrawn_account(&db, t0(), 30).await;

        let result = run_cleanup(&db, &config(), t0() + Duration::days(10))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 0);
        assert!(db.accounts().get_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_run_after_deadline_erases_exactly_the_expired() {
        let (_pool, db) = setup().await;
        let expired = withdrawn_account(&db, t0(), 10).await;
        let pending = withdrawn_account(&db, t0(), 60).await;

        let result = run_cleanup(&db, &config(), t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 1);
        assert_eq!(result.accounts_failed, 0);
        assert!(db.accounts().get_by_id(expired).await.unwrap().is_none());
        assert!(db.accounts().get_by_id(pending).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_second_run_finds_nothing() {
        let (_pool, db) = setup().await;
        withdrawn_account(&db, t0(), 10).await;

        let now = t0() + Duration::days(30);
        let first = run_cleanup(&db, &config(), now).await.unwrap();
        let second = run_cleanup(&db, &config(), now + Duration::days(1))
            .await
            .unwrap();

        assert_eq!(first.accounts_erased, 1);
        assert_eq!(second.accounts_erased, 0);
    }

    #[tokio::test]
    async fn test_deadline_boundary_is_inclusive() {
        let (_pool, db) = setup().await;
        let id = withdrawn_account(&db, t0(), 30).await;

        let result = run_cleanup(&db, &config(), t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 1);
        assert!(db.accounts().get_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_related_data_cleaned_up_with_account() {
        let (pool, db) = setup().await;
        let id = withdrawn_account(&db, t0(), 10).await;
        let account_id = id.to_string();

        sqlx::query(
            "INSERT INTO chat_messages (id, author_id, channel_id, body, created_at) VALUES (?, ?, 'general', 'hello', ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&account_id)
        .bind(t0())
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO memberships (id, account_id, workspace_id, role, created_at) VALUES (?, ?, ?, 'member', ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&account_id)
        .bind(Uuid::new_v4().to_string())
        .bind(t0())
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO hashtag_links (id, account_id, hashtag, created_at) VALUES (?, ?, 'standup', ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&account_id)
        .bind(t0())
        .execute(&pool)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO notification_logs (id, account_id, kind, payload, created_at) VALUES (?, ?, 'mention', NULL, ?)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&account_id)
        .bind(t0())
        .execute(&pool)
        .await
        .unwrap();

        let result = run_cleanup(&db, &config(), t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 1);
        assert_eq!(result.chat_messages_deleted, 1);
        assert_eq!(result.memberships_deleted, 1);
        assert_eq!(result.hashtag_links_deleted, 1);
        assert_eq!(result.notification_logs_deleted, 1);

        let remaining: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_messages WHERE author_id = ?")
                .bind(&account_id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(remaining, 0);
    }

    #[tokio::test]
    async fn test_failed_account_does_not_abort_the_run() {
        let (pool, db) = setup().await;
        let blocked = withdrawn_account(&db, t0(), 5).await;
        let erasable = withdrawn_account(&db, t0(), 10).await;

        // Make deleting the first account's row fail inside its transaction.
        let trigger = format!(
            r#"
            CREATE TRIGGER block_erase BEFORE DELETE ON accounts
            WHEN OLD.id = '{}'
            BEGIN SELECT RAISE(ABORT, 'erase blocked'); END
            "#,
            blocked
        );
        sqlx::query(&trigger).execute(&pool).await.unwrap();

        let result = run_cleanup(&db, &config(), t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 1);
        assert_eq!(result.accounts_failed, 1);
        // The failed unit rolled back whole: the account is still erasable.
        assert!(db.accounts().get_by_id(blocked).await.unwrap().is_some());
        assert!(db.accounts().get_by_id(erasable).await.unwrap().is_none());

        // Next run retries the failure once the trigger is gone.
        sqlx::query("DROP TRIGGER block_erase").execute(&pool).await.unwrap();
        let retry = run_cleanup(&db, &config(), t0() + Duration::days(31))
            .await
            .unwrap();
        assert_eq!(retry.accounts_erased, 1);
        assert!(db.accounts().get_by_id(blocked).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_account_does_not_starve_small_batches() {
        let (pool, db) = setup().await;
        // The failing account has the earliest deadline, so with a batch size
        // of 1 it fills every fetch unless the run pages past it.
        let blocked = withdrawn_account(&db, t0(), 5).await;
        let healthy = withdrawn_account(&db, t0(), 10).await;

        let trigger = format!(
            r#"
            CREATE TRIGGER block_erase BEFORE DELETE ON accounts
            WHEN OLD.id = '{}'
            BEGIN SELECT RAISE(ABORT, 'erase blocked'); END
            "#,
            blocked
        );
        sqlx::query(&trigger).execute(&pool).await.unwrap();

        let mut cfg = config();
        cfg.safety.batch_size = 1;
        let result = run_cleanup(&db, &cfg, t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_failed, 1);
        assert_eq!(result.accounts_erased, 1);
        assert!(db.accounts().get_by_id(healthy).await.unwrap().is_none());
        assert!(db.accounts().get_by_id(blocked).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_dry_run_erases_nothing() {
        let (_pool, db) = setup().await;
        let id = withdrawn_account(&db, t0(), 10).await;

        let mut cfg = config();
        cfg.safety.dry_run = true;
        let result = run_cleanup(&db, &cfg, t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 1);
        assert!(db.accounts().get_by_id(id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_max_erasures_per_run_caps_the_batch() {
        let (_pool, db) = setup().await;
        for _ in 0..3 {
            withdrawn_account(&db, t0(), 10).await;
        }

        let mut cfg = config();
        cfg.safety.max_erasures_per_run = 2;
        let result = run_cleanup(&db, &cfg, t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 2);
        assert_eq!(
            pending_counts(&db, t0() + Duration::days(30))
                .await
                .unwrap()
                .erasable,
            1
        );
    }

    #[tokio::test]
    async fn test_purge_before_uses_supplied_cutoff() {
        let (_pool, db) = setup().await;
        let old = withdrawn_account(&db, t0(), 10).await;
        let recent = withdrawn_account(&db, t0(), 60).await;

        // Operator purge with a cutoff between the two deadlines.
        let result = purge_before(&db, &config(), t0() + Duration::days(30))
            .await
            .unwrap();

        assert_eq!(result.accounts_erased, 1);
        assert!(db.accounts().get_by_id(old).await.unwrap().is_none());
        assert!(db.accounts().get_by_id(recent).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_pending_counts() {
        let (_pool, db) = setup().await;
        withdrawn_account(&db, t0(), 10).await;
        withdrawn_account(&db, t0(), 60).await;
        db.accounts()
            .create(CreateAccount {
                email: "active@example.com".to_string(),
                display_name: "Active".to_string(),
            })
            .await
            .unwrap();

        let counts = pending_counts(&db, t0() + Duration::days(30)).await.unwrap();
        assert_eq!(counts.erasable, 1);
        assert_eq!(counts.withdrawn, 1);
    }
}
