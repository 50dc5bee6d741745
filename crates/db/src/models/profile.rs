//! Member profile rows.

use qaforum_core::records::AuthorProfile;
use qaforum_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `profiles` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Profile {
    pub id: DbId,
    pub username: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub reputation: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<Profile> for AuthorProfile {
    fn from(row: Profile) -> Self {
        AuthorProfile {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            avatar_url: row.avatar_url,
            reputation: row.reputation,
        }
    }
}
