use crate::types::DbId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("Backing store unavailable: {0}")]
    Network(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for CoreError {
    fn from(errors: validator::ValidationErrors) -> Self {
        CoreError::Validation(errors.to_string())
    }
}

impl CoreError {
    /// Whether the caller may retry the same action later without changing it.
    ///
    /// Only store outages and in-flight collisions qualify; validation and
    /// auth failures need the caller to change something first.
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::Conflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity_and_id() {
        let err = CoreError::NotFound {
            entity: "question",
            id: 42,
        };
        assert_eq!(err.to_string(), "Entity not found: question with id 42");
    }

    #[test]
    fn network_and_conflict_are_transient() {
        assert!(CoreError::Network("down".into()).is_transient());
        assert!(CoreError::Conflict("busy".into()).is_transient());
        assert!(!CoreError::Validation("bad".into()).is_transient());
        assert!(!CoreError::AuthRequired("login".into()).is_transient());
    }
}
