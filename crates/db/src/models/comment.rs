//! Comment rows.

use qaforum_core::error::CoreError;
use qaforum_core::records::{CommentTarget, RawComment};
use qaforum_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `comments` table.
///
/// The table's check constraint keeps exactly one of `question_id` /
/// `answer_id` set; [`RawComment`] conversion re-checks it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Comment {
    pub id: DbId,
    pub content: String,
    pub author_id: Option<DbId>,
    pub question_id: Option<DbId>,
    pub answer_id: Option<DbId>,
    pub created_at: Timestamp,
}

impl TryFrom<Comment> for RawComment {
    type Error = CoreError;

    fn try_from(row: Comment) -> Result<Self, Self::Error> {
        Ok(RawComment {
            id: row.id,
            target: CommentTarget::from_columns(row.question_id, row.answer_id)?,
            content: row.content,
            author_id: row.author_id,
            created_at: row.created_at,
        })
    }
}
