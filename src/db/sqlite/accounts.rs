use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool, sqlite::SqliteRow};
use uuid::Uuid;

use super::common::parse_uuid;
use crate::{
    db::{
        error::{DbError, DbResult},
        repos::{AccountRepo, EraseStats},
    },
    models::{Account, CreateAccount},
};

pub struct SqliteAccountRepo {
    pool: SqlitePool,
}

impl SqliteAccountRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_account(row: &SqliteRow) -> DbResult<Account> {
        Ok(Account {
            id: parse_uuid(&row.get::<String, _>("id"))?,
            email: row.get("email"),
            display_name: row.get("display_name"),
            deleted_at: row.get("deleted_at"),
            permanent_deletion_date: row.get("permanent_deletion_date"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }
}

const SELECT_COLUMNS: &str =
    "id, email, display_name, deleted_at, permanent_deletion_date, created_at, updated_at";

#[async_trait]
impl AccountRepo for SqliteAccountRepo {
    async fn create(&self, input: CreateAccount) -> DbResult<Account> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, email, display_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&input.email)
        .bind(&input.display_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id,
            email: input.email,
            display_name: input.display_name,
            deleted_at: None,
            permanent_deletion_date: None,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: Uuid) -> DbResult<Option<Account>> {
        let query = format!("SELECT {} FROM accounts WHERE id = ?", SELECT_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| Self::row_to_account(&r)).transpose()
    }

    async fn mark_withdrawn(
        &self,
        id: Uuid,
        deleted_at: DateTime<Utc>,
        permanent_deletion_date: DateTime<Utc>,
    ) -> DbResult<Option<Account>> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET deleted_at = ?, permanent_deletion_date = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(deleted_at)
        .bind(permanent_deletion_date)
        .bind(deleted_at)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn clear_withdrawal(&self, id: Uuid, now: DateTime<Utc>) -> DbResult<Option<Account>> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET deleted_at = NULL, permanent_deletion_date = NULL, updated_at = ?
            WHERE id = ?
              AND deleted_at IS NOT NULL
              AND permanent_deletion_date > ?
            "#,
        )
        .bind(now)
        .bind(id.to_string())
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn find_erasable(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
        exclude: &[Uuid],
    ) -> DbResult<Vec<Account>> {
        let exclusion = if exclude.is_empty() {
            String::new()
        } else {
            let placeholders = vec!["?"; exclude.len()].join(", ");
            format!("AND id NOT IN ({})", placeholders)
        };
        let query = format!(
            r#"
            SELECT {}
            FROM accounts
            WHERE deleted_at IS NOT NULL AND permanent_deletion_date <= ? {}
            ORDER BY permanent_deletion_date ASC
            LIMIT ?
            "#,
            SELECT_COLUMNS, exclusion
        );

        let mut q = sqlx::query(&query).bind(cutoff);
        for id in exclude {
            q = q.bind(id.to_string());
        }
        let rows = q.bind(limit).fetch_all(&self.pool).await?;

        rows.iter().map(Self::row_to_account).collect()
    }

    async fn count_erasable(&self, cutoff: DateTime<Utc>) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM accounts
            WHERE deleted_at IS NOT NULL AND permanent_deletion_date <= ?
            "#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn count_withdrawn(&self, now: DateTime<Utc>) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM accounts
            WHERE deleted_at IS NOT NULL AND permanent_deletion_date > ?
            "#,
        )
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn erase(&self, id: Uuid) -> DbResult<EraseStats> {
        let account_id = id.to_string();
        let mut tx = self.pool.begin().await?;
        let mut stats = EraseStats::default();

        // Authored comments stay in their threads but lose the author link.
        stats.comments_anonymized = sqlx::query(
            "UPDATE comments SET author_id = NULL WHERE author_id = ?",
        )
        .bind(&account_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        stats.chat_messages_deleted =
            sqlx::query("DELETE FROM chat_messages WHERE author_id = ?")
                .bind(&account_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        stats.memberships_deleted =
            sqlx::query("DELETE FROM memberships WHERE account_id = ?")
                .bind(&account_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        stats.hashtag_links_deleted =
            sqlx::query("DELETE FROM hashtag_links WHERE account_id = ?")
                .bind(&account_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        stats.notification_logs_deleted =
            sqlx::query("DELETE FROM notification_logs WHERE account_id = ?")
                .bind(&account_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        // The account row itself goes last; a missing row rolls everything back.
        let deleted = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(&account_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(DbError::NotFound);
        }

        tx.commit().await?;
        Ok(stats)
    }
}
