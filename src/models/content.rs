//! Content entities forming the ownership graph.
//!
//! A board owns posts; a post owns comments and attachments. Ownership edges
//! are declared once on [`EntityKind`](crate::lifecycle::EntityKind) and the
//! cascade walker in the persistence layer fans soft deletes out along them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::lifecycle::Deletable;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    pub id: Uuid,
    pub name: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub body: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    /// None once the author's account has been erased.
    pub author_id: Option<Uuid>,
    pub body: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub file_name: String,
    pub size_bytes: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

macro_rules! impl_deletable {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Deletable for $ty {
                fn deleted_at(&self) -> Option<DateTime<Utc>> {
                    self.deleted_at
                }

                fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
                    self.deleted_at = at;
                }
            }
        )+
    };
}

impl_deletable!(Board, Post, Comment, Attachment);

#[derive(Debug, Clone, Deserialize)]
pub struct CreateBoard {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub board_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub post_id: Uuid,
    pub author_id: Option<Uuid>,
    pub body: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAttachment {
    pub post_id: Uuid,
    pub file_name: String,
    pub size_bytes: i64,
}
