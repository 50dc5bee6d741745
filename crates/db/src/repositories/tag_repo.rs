//! Repository for the `tags` and `question_tags` tables.

use qaforum_core::records::normalize_tag_name;
use qaforum_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::tag::{QuestionTag, TagWithCount};

pub struct TagRepo;

impl TagRepo {
    /// Create a tag or return the existing one if the normalized name already
    /// exists, inside the caller's transaction. Returns the tag id.
    pub(crate) async fn create_or_get_id(
        tx: &mut Transaction<'_, Postgres>,
        name: &str,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO tags (name) VALUES ($1) \
             ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id",
        )
        .bind(normalize_tag_name(name))
        .fetch_one(&mut **tx)
        .await
    }

    /// Tags attached to the given questions, in attachment order per question.
    pub async fn list_for_questions(
        pool: &PgPool,
        question_ids: &[DbId],
    ) -> Result<Vec<QuestionTag>, sqlx::Error> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, QuestionTag>(
            "SELECT qt.question_id, t.id, t.name, qt.position \
             FROM question_tags qt \
             JOIN tags t ON t.id = qt.tag_id \
             WHERE qt.question_id = ANY($1) \
             ORDER BY qt.question_id, qt.position, t.name",
        )
        .bind(question_ids)
        .fetch_all(pool)
        .await
    }

    /// Tags in use, with their question counts, sorted by name.
    pub async fn list_with_counts(pool: &PgPool) -> Result<Vec<TagWithCount>, sqlx::Error> {
        sqlx::query_as::<_, TagWithCount>(
            "SELECT t.id, t.name, COUNT(qt.question_id) AS question_count \
             FROM tags t \
             JOIN question_tags qt ON qt.tag_id = t.id \
             GROUP BY t.id, t.name \
             HAVING COUNT(qt.question_id) > 0 \
             ORDER BY t.name",
        )
        .fetch_all(pool)
        .await
    }
}
