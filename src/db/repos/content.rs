use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    db::error::DbResult,
    lifecycle::{EntityKind, LifecycleState},
    models::{
        Attachment, Board, Comment, CreateAttachment, CreateBoard, CreateComment, CreatePost, Post,
    },
};

/// Repository for the board/post/comment/attachment ownership graph.
///
/// All getters are active read paths: soft-deleted rows are excluded.
/// Lifecycle inspection that must see deleted rows goes through
/// [`lifecycle_state`](ContentRepo::lifecycle_state).
#[async_trait]
pub trait ContentRepo: Send + Sync {
    async fn create_board(&self, input: CreateBoard) -> DbResult<Board>;

    async fn create_post(&self, input: CreatePost) -> DbResult<Post>;

    async fn create_comment(&self, input: CreateComment) -> DbResult<Comment>;

    async fn create_attachment(&self, input: CreateAttachment) -> DbResult<Attachment>;

    async fn get_board(&self, id: Uuid) -> DbResult<Option<Board>>;

    async fn get_post(&self, id: Uuid) -> DbResult<Option<Post>>;

    async fn get_comment(&self, id: Uuid) -> DbResult<Option<Comment>>;

    async fn get_attachment(&self, id: Uuid) -> DbResult<Option<Attachment>>;

    /// List a board's posts, newest first.
    async fn list_posts(&self, board_id: Uuid, include_deleted: bool) -> DbResult<Vec<Post>>;

    /// Soft-delete an entity and every descendant reachable through declared
    /// ownership edges, in one transaction.
    ///
    /// The walk is depth-first over [`EntityKind::children`] and idempotent
    /// per node: already-deleted rows keep their original timestamp and a
    /// re-invocation on a deleted subtree writes nothing further. Returns
    /// the number of rows newly marked. `DbError::NotFound` if the root row
    /// does not exist.
    async fn soft_delete(&self, kind: EntityKind, id: Uuid) -> DbResult<u64>;

    /// Clear the deletion timestamp on a single entity.
    ///
    /// Shallow: children deleted by an earlier cascade stay deleted. No-op
    /// if the entity is already active.
    async fn restore(&self, kind: EntityKind, id: Uuid) -> DbResult<()>;

    /// Lifecycle view of a row, deleted or not. `None` if the row does not
    /// exist at all.
    async fn lifecycle_state(&self, kind: EntityKind, id: Uuid) -> DbResult<Option<LifecycleState>>;
}
