//! Repository for the `answers` table.

use qaforum_core::types::DbId;
use sqlx::PgPool;

use crate::models::answer::{Answer, AnswerCount};

/// Column list for `answers` queries.
const COLUMNS: &str = "id, question_id, author_id, content, created_at, updated_at";

pub struct AnswerRepo;

impl AnswerRepo {
    /// Answers to one question, oldest first.
    pub async fn list_by_question(
        pool: &PgPool,
        question_id: DbId,
    ) -> Result<Vec<Answer>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM answers WHERE question_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Answer>(&query)
            .bind(question_id)
            .fetch_all(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        question_id: DbId,
        author_id: DbId,
        content: &str,
    ) -> Result<Answer, sqlx::Error> {
        let query = format!(
            "INSERT INTO answers (question_id, author_id, content) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Answer>(&query)
            .bind(question_id)
            .bind(author_id)
            .bind(content)
            .fetch_one(pool)
            .await
    }

    /// Answer counts for the given questions. Questions without answers are
    /// absent from the result.
    pub async fn count_by_questions(
        pool: &PgPool,
        question_ids: &[DbId],
    ) -> Result<Vec<AnswerCount>, sqlx::Error> {
        if question_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, AnswerCount>(
            "SELECT question_id, COUNT(*) AS answer_count \
             FROM answers \
             WHERE question_id = ANY($1) \
             GROUP BY question_id",
        )
        .bind(question_ids)
        .fetch_all(pool)
        .await
    }

    pub async fn count_by_author(pool: &PgPool, author_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM answers WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(pool)
            .await
    }
}
