//! Entity lifecycle contract and cascade declaration.
//!
//! Every deletable record implements [`Deletable`]: a nullable deletion
//! timestamp with idempotent `mark_deleted`, shallow `restore`, and derived
//! `is_active`. Content entities additionally declare their ownership edges
//! on [`EntityKind`]; the persistence layer walks those edges depth-first
//! when a parent is soft-deleted, so no entity kind re-implements cascade
//! propagation itself.

mod cascade;
mod deletable;

pub use cascade::EntityKind;
pub use deletable::Deletable;

use chrono::{DateTime, Utc};

/// Persisted lifecycle view of a single row, readable even when the row is
/// soft-deleted (active read paths exclude such rows entirely).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleState {
    pub deleted_at: Option<DateTime<Utc>>,
}

impl LifecycleState {
    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
