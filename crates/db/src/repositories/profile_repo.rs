//! Repository for the `profiles` table.

use qaforum_core::types::DbId;
use sqlx::PgPool;

use crate::models::profile::Profile;

/// Column list for `profiles` queries.
const COLUMNS: &str = "id, username, display_name, avatar_url, reputation, created_at, updated_at";

pub struct ProfileRepo;

impl ProfileRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Profile>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = $1");
        sqlx::query_as::<_, Profile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Load every profile whose id is in `ids`. Unknown ids are skipped.
    pub async fn find_by_ids(pool: &PgPool, ids: &[DbId]) -> Result<Vec<Profile>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!("SELECT {COLUMNS} FROM profiles WHERE id = ANY($1)");
        sqlx::query_as::<_, Profile>(&query)
            .bind(ids)
            .fetch_all(pool)
            .await
    }
}
