use qaforum_core::error::CoreError;

/// Error type for client setup and the Postgres backend.
///
/// Wraps [`CoreError`] for domain errors and adds the database failures
/// that can only happen while connecting or migrating. Once a backend is
/// running every failure is folded into a [`CoreError`] via
/// [`classify_sqlx_error`].
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A domain-level error from `qaforum_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for CoreError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Core(core) => core,
            ClientError::Database(db) => classify_sqlx_error(&db),
            ClientError::Migration(m) => CoreError::Internal(m.to_string()),
        }
    }
}

/// Classify a sqlx error into the domain taxonomy.
///
/// - Pool exhaustion, a closed pool and I/O or TLS failures map to `Network`.
/// - `RowNotFound` maps to `Internal`: lookups that may miss use
///   `fetch_optional`, so reaching it means a broken query.
/// - Unique constraint violations (constraint name starting with `uq_`) map to `Conflict`.
/// - Foreign-key and check violations map to `Validation`.
/// - Everything else maps to `Internal` with a sanitized message.
pub fn classify_sqlx_error(err: &sqlx::Error) -> CoreError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            tracing::warn!(error = %err, "Database pool unavailable");
            CoreError::Network("The forum is unreachable right now".to_string())
        }
        sqlx::Error::Io(io) => {
            tracing::warn!(error = %io, "Database connection failed");
            CoreError::Network("The forum is unreachable right now".to_string())
        }
        sqlx::Error::Tls(tls) => {
            tracing::warn!(error = %tls, "Database TLS failure");
            CoreError::Network("The forum is unreachable right now".to_string())
        }
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            // PostgreSQL unique constraint violation
            Some("23505") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                if constraint.starts_with("uq_") {
                    CoreError::Conflict(format!(
                        "Duplicate value violates unique constraint: {constraint}"
                    ))
                } else {
                    internal(db_err)
                }
            }
            // foreign_key_violation
            Some("23503") => CoreError::Validation("Referenced record does not exist".to_string()),
            // check_violation
            Some("23514") => {
                let constraint = db_err.constraint().unwrap_or("unknown");
                CoreError::Validation(format!("Value violates check constraint: {constraint}"))
            }
            _ => internal(db_err),
        },
        other => internal(other),
    }
}

fn internal(err: &dyn std::fmt::Display) -> CoreError {
    tracing::error!(error = %err, "Database error");
    CoreError::Internal("An internal error occurred".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn pool_failures_are_network_errors() {
        assert_matches!(
            classify_sqlx_error(&sqlx::Error::PoolTimedOut),
            CoreError::Network(_)
        );
        assert_matches!(
            classify_sqlx_error(&sqlx::Error::PoolClosed),
            CoreError::Network(_)
        );
    }

    #[test]
    fn io_failure_is_transient() {
        let err = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(classify_sqlx_error(&err).is_transient());
    }

    #[test]
    fn row_not_found_is_internal() {
        assert_matches!(
            classify_sqlx_error(&sqlx::Error::RowNotFound),
            CoreError::Internal(_)
        );
    }

    #[test]
    fn client_error_folds_into_core() {
        let err = ClientError::Core(CoreError::Validation("bad".into()));
        assert_eq!(CoreError::from(err), CoreError::Validation("bad".into()));
    }
}
