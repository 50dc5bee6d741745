//! Explicit session context passed into every engine entry point.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// The signed-in member, as far as the engine needs to know.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: DbId,
    pub username: String,
    pub display_name: String,
}

/// Who is acting. An anonymous session can read but not write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user: Option<SessionUser>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { user: None }
    }

    pub fn signed_in(user: SessionUser) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&SessionUser> {
        self.user.as_ref()
    }

    /// Id of the viewer, used to resolve "my vote" in aggregate counts.
    pub fn viewer_id(&self) -> Option<DbId> {
        self.user.as_ref().map(|u| u.id)
    }

    /// The signed-in user, or `AuthRequired` naming the attempted action.
    pub fn require_user(&self, action: &str) -> Result<&SessionUser, CoreError> {
        self.user
            .as_ref()
            .ok_or_else(|| CoreError::AuthRequired(format!("Sign in to {action}")))
    }
}
