//! Repository for the `comments` table.

use qaforum_core::records::CommentTarget;
use qaforum_core::types::DbId;
use sqlx::PgPool;

use crate::models::comment::Comment;

/// Column list for `comments` queries.
const COLUMNS: &str = "id, content, author_id, question_id, answer_id, created_at";

pub struct CommentRepo;

impl CommentRepo {
    /// Comments on a question and on any of the given answers, oldest first.
    pub async fn list_for_thread(
        pool: &PgPool,
        question_id: DbId,
        answer_ids: &[DbId],
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM comments \
             WHERE question_id = $1 OR answer_id = ANY($2) \
             ORDER BY created_at, id"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(question_id)
            .bind(answer_ids)
            .fetch_all(pool)
            .await
    }

    pub async fn create(
        pool: &PgPool,
        author_id: DbId,
        target: CommentTarget,
        content: &str,
    ) -> Result<Comment, sqlx::Error> {
        let (question_id, answer_id) = target.to_columns();
        let query = format!(
            "INSERT INTO comments (content, author_id, question_id, answer_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Comment>(&query)
            .bind(content)
            .bind(author_id)
            .bind(question_id)
            .bind(answer_id)
            .fetch_one(pool)
            .await
    }

    pub async fn count_by_author(pool: &PgPool, author_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(pool)
            .await
    }
}
