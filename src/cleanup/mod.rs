//! Grace-period cleanup job.
//!
//! A background worker that periodically:
//! 1. Finds withdrawn accounts whose permanent deletion deadline has passed
//! 2. Cleans up each account's related data (authored comments are
//!    anonymized; chat messages, memberships, hashtag links, and
//!    notification logs are deleted)
//! 3. Physically and irreversibly deletes the account row
//!
//! Each account is an independent atomic unit of work: a failure is logged
//! with a masked email and skipped, never aborting the rest of the run, and
//! the account stays erasable so the next run's re-query retries it. Dry-run
//! mode logs what would be erased without erasing.

mod worker;

pub use worker::{
    CleanupRunResult, PendingCounts, pending_counts, purge_before, run_cleanup,
    start_cleanup_worker,
};
