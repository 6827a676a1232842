use chrono::{DateTime, Utc};

/// Base capability of every logically-deletable entity.
///
/// Implementors provide access to the deletion timestamp; the lifecycle
/// operations are provided methods so their semantics cannot drift between
/// entity kinds. The invariant throughout the codebase is
/// `deleted_at != None` ⇔ the entity is logically deleted and excluded from
/// active read paths.
pub trait Deletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>);

    /// Mark the entity deleted at `now`.
    ///
    /// Idempotent: a second call never overwrites the original timestamp.
    /// Cascading to owned children is the persistence layer's job, not the
    /// entity's.
    fn mark_deleted(&mut self, now: DateTime<Utc>) {
        if self.deleted_at().is_none() {
            self.set_deleted_at(Some(now));
        }
    }

    /// Clear the deletion timestamp.
    ///
    /// Restore is intentionally shallow: cascade deletion is a one-way
    /// fan-out, so restoring a parent never restores its children.
    fn restore(&mut self) {
        self.set_deleted_at(None);
    }

    fn is_active(&self) -> bool {
        self.deleted_at().is_none()
    }
}
