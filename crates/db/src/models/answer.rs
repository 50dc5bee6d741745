//! Answer rows.

use qaforum_core::records::RawAnswer;
use qaforum_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `answers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Answer {
    pub id: DbId,
    pub question_id: DbId,
    pub author_id: Option<DbId>,
    pub content: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Answer> for RawAnswer {
    fn from(row: Answer) -> Self {
        RawAnswer {
            id: row.id,
            question_id: row.question_id,
            author_id: row.author_id,
            content: row.content,
            created_at: row.created_at,
        }
    }
}

/// Answer count for one question.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerCount {
    pub question_id: DbId,
    pub answer_count: i64,
}
