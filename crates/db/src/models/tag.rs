//! Tag and question-tag rows.

use qaforum_core::records::{TagCount, TagRecord};
use qaforum_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A tag attached to a question, with its attachment position.
#[derive(Debug, Clone, FromRow)]
pub struct QuestionTag {
    pub question_id: DbId,
    pub id: DbId,
    pub name: String,
    pub position: i32,
}

impl From<QuestionTag> for TagRecord {
    fn from(row: QuestionTag) -> Self {
        TagRecord {
            id: row.id,
            name: row.name,
        }
    }
}

/// A tag with the number of questions carrying it.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TagWithCount {
    pub id: DbId,
    pub name: String,
    pub question_count: i64,
}

impl From<TagWithCount> for TagCount {
    fn from(row: TagWithCount) -> Self {
        TagCount {
            id: row.id,
            name: row.name,
            question_count: row.question_count,
        }
    }
}
