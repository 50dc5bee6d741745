//! Question rows.

use qaforum_core::records::RawQuestion;
use qaforum_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `questions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Question {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub author_id: Option<DbId>,
    pub views: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Question> for RawQuestion {
    fn from(row: Question) -> Self {
        RawQuestion {
            id: row.id,
            title: row.title,
            description: row.description,
            author_id: row.author_id,
            views: row.views,
            created_at: row.created_at,
        }
    }
}
