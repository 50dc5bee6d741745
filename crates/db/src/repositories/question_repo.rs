//! Repository for the `questions` table and its tag attachments.

use qaforum_core::submission::NewQuestion;
use qaforum_core::types::DbId;
use sqlx::PgPool;

use crate::models::question::Question;
use crate::repositories::tag_repo::TagRepo;

/// Column list for `questions` queries.
const COLUMNS: &str = "id, title, description, author_id, views, created_at, updated_at";

pub struct QuestionRepo;

impl QuestionRepo {
    /// Every question, newest first.
    pub async fn list_all(pool: &PgPool) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, Question>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Question>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM questions WHERE id = $1");
        sqlx::query_as::<_, Question>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Questions written by one member, newest first.
    pub async fn list_by_author(
        pool: &PgPool,
        author_id: DbId,
    ) -> Result<Vec<Question>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM questions WHERE author_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, Question>(&query)
            .bind(author_id)
            .fetch_all(pool)
            .await
    }

    /// Insert a question and attach its tags in one transaction.
    ///
    /// Tags are created on first use. `question` is expected to be
    /// normalized already (see [`NewQuestion::prepare`]).
    pub async fn create(
        pool: &PgPool,
        author_id: DbId,
        question: &NewQuestion,
    ) -> Result<Question, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO questions (title, description, author_id) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let created = sqlx::query_as::<_, Question>(&query)
            .bind(&question.title)
            .bind(&question.description)
            .bind(author_id)
            .fetch_one(&mut *tx)
            .await?;

        for (position, name) in question.tags.iter().enumerate() {
            let tag_id = TagRepo::create_or_get_id(&mut tx, name).await?;
            sqlx::query(
                "INSERT INTO question_tags (question_id, tag_id, position) \
                 VALUES ($1, $2, $3) \
                 ON CONFLICT (question_id, tag_id) DO NOTHING",
            )
            .bind(created.id)
            .bind(tag_id)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(question_id = created.id, tags = question.tags.len(), "Question created");
        Ok(created)
    }

    /// Bump the view counter. Returns `false` if the question does not exist.
    pub async fn increment_views(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE questions SET views = views + 1 WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_author(pool: &PgPool, author_id: DbId) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(pool)
            .await
    }
}
