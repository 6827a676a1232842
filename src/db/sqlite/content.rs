use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::{Row, SqliteConnection, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::ContentRepo,
    },
    lifecycle::{EntityKind, LifecycleState},
    models::{
        Attachment, Board, Comment, CreateAttachment, CreateBoard, CreateComment, CreatePost, Post,
    },
    observability::metrics,
};

pub struct SqliteContentRepo {
    pool: SqlitePool,
}

impl SqliteContentRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_board(row: &SqliteRow) -> DbResult<Board> {
        Ok(Board {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            name: row.get("name"),
            deleted_at: row.get("deleted_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_post(row: &SqliteRow) -> DbResult<Post> {
        Ok(Post {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            board_id: parse_uuid(&row.get::<String, _>("board_id"))?,
            title: row.get("title"),
            body: row.get("body"),
            deleted_at: row.get("deleted_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_comment(row: &SqliteRow) -> DbResult<Comment> {
        let author_id: Option<String> = row.get("author_id");
        Ok(Comment {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            post_id: parse_uuid(&row.get::<String, _>("post_id"))?,
            author_id: author_id.as_deref().map(parse_uuid).transpose()?,
            body: row.get("body"),
            deleted_at: row.get("deleted_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    fn row_to_attachment(row: &SqliteRow) -> DbResult<Attachment> {
        Ok(Attachment {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            post_id: parse_uuid(&row.get::<String, _>("post_id"))?,
            file_name: row.get("file_name"),
            size_bytes: row.get("size_bytes"),
            deleted_at: row.get("deleted_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

/// Depth-first fan-out along declared ownership edges, inside the caller's
/// transaction.
///
/// Each child level is bulk-marked with a `deleted_at IS NULL` guard, so
/// already-deleted rows keep their original timestamp and re-walking a
/// deleted subtree writes nothing. Recursion descends through every child
/// row (marked now or earlier) so a partially-deleted subtree is still
/// completed. Returns the number of rows newly marked.
fn cascade_children<'a>(
    conn: &'a mut SqliteConnection,
    kind: EntityKind,
    parent_id: String,
    now: DateTime<Utc>,
) -> BoxFuture<'a, DbResult<u64>> {
    Box::pin(async move {
        let mut marked = 0u64;

        for &child in kind.children() {
            let Some(parent_column) = child.parent_column() else {
                continue;
            };

            let update = format!(
                "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE {} = ? AND deleted_at IS NULL",
                child.table(),
                parent_column
            );
            marked += sqlx::query(&update)
                .bind(now)
                .bind(now)
                .bind(&parent_id)
                .execute(&mut *conn)
                .await?
                .rows_affected();

            if !child.children().is_empty() {
                let select = format!(
                    "SELECT id FROM {} WHERE {} = ?",
                    child.table(),
                    parent_column
                );
                let child_ids: Vec<String> = sqlx::query_scalar(&select)
                    .bind(&parent_id)
                    .fetch_all(&mut *conn)
                    .await?;

                for child_id in child_ids {
                    marked += cascade_children(&mut *conn, child, child_id, now).await?;
                }
            }
        }

        Ok(marked)
    })
}

#[async_trait]
impl ContentRepo for SqliteContentRepo {
    async fn create_board(&self, input: CreateBoard) -> DbResult<Board> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO boards (id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(id.to_string())
        .bind(&input.name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Board {
            id,
            name: input.name,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_post(&self, input: CreatePost) -> DbResult<Post> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO posts (id, board_id, title, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(input.board_id.to_string())
        .bind(&input.title)
        .bind(&input.body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Post {
            id,
            board_id: input.board_id,
            title: input.title,
            body: input.body,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_comment(&self, input: CreateComment) -> DbResult<Comment> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO comments (id, post_id, author_id, body, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(input.post_id.to_string())
        .bind(input.author_id.map(|a| a.to_string()))
        .bind(&input.body)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Comment {
            id,
            post_id: input.post_id,
            author_id: input.author_id,
            body: input.body,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn create_attachment(&self, input: CreateAttachment) -> DbResult<Attachment> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO attachments (id, post_id, file_name, size_bytes, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(input.post_id.to_string())
        .bind(&input.file_name)
        .bind(input.size_bytes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Attachment {
            id,
            post_id: input.post_id,
            file_name: input.file_name,
            size_bytes: input.size_bytes,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_board(&self, id: Uuid) -> DbResult<Option<Board>> {
        let row = sqlx::query("SELECT * FROM boards WHERE id = ? AND deleted_at IS NULL")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_board(&r)).transpose()
    }

    async fn get_post(&self, id: Uuid) -> DbResult<Option<Post>> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ? AND deleted_at IS NULL")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_post(&r)).transpose()
    }

    async fn get_comment(&self, id: Uuid) -> DbResult<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = ? AND deleted_at IS NULL")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_comment(&r)).transpose()
    }

    async fn get_attachment(&self, id: Uuid) -> DbResult<Option<Attachment>> {
        let row = sqlx::query("SELECT * FROM attachments WHERE id = ? AND deleted_at IS NULL")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| Self::row_to_attachment(&r)).transpose()
    }

    async fn list_posts(&self, board_id: Uuid, include_deleted: bool) -> DbResult<Vec<Post>> {
        let deleted_filter = if include_deleted {
            ""
        } else {
            "AND deleted_at IS NULL"
        };
        let query = format!(
            "SELECT * FROM posts WHERE board_id = ? {} ORDER BY created_at DESC",
            deleted_filter
        );

        let rows = sqlx::query(&query)
            .bind(board_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::row_to_post).collect()
    }

    async fn soft_delete(&self, kind: EntityKind, id: Uuid) -> DbResult<u64> {
        let now = Utc::now();
        let root_id = id.to_string();
        let mut tx = self.pool.begin().await?;

        let exists_query = format!("SELECT 1 FROM {} WHERE id = ?", kind.table());
        let exists = sqlx::query(&exists_query)
            .bind(&root_id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(DbError::NotFound);
        }

        let update = format!(
            "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
            kind.table()
        );
        let mut marked = sqlx::query(&update)
            .bind(now)
            .bind(now)
            .bind(&root_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        marked += cascade_children(&mut *tx, kind, root_id, now).await?;
        tx.commit().await?;

        if marked > 0 {
            metrics::record_cascade_marked(kind.table(), marked);
        }
        Ok(marked)
    }

    async fn restore(&self, kind: EntityKind, id: Uuid) -> DbResult<()> {
        let update = format!(
            "UPDATE {} SET deleted_at = NULL, updated_at = ? WHERE id = ? AND deleted_at IS NOT NULL",
            kind.table()
        );
        let restored = sqlx::query(&update)
            .bind(Utc::now())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?
            .rows_affected();

        if restored > 0 {
            return Ok(());
        }

        // Nothing restored: no-op if the row is already active, NotFound otherwise.
        let exists_query = format!("SELECT 1 FROM {} WHERE id = ?", kind.table());
        let exists = sqlx::query(&exists_query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        if exists.is_none() {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn lifecycle_state(
        &self,
        kind: EntityKind,
        id: Uuid,
    ) -> DbResult<Option<LifecycleState>> {
        let query = format!("SELECT deleted_at FROM {} WHERE id = ?", kind.table());
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| LifecycleState {
            deleted_at: r.get("deleted_at"),
        }))
    }
}
