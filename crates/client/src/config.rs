use qaforum_core::error::CoreError;
use qaforum_core::pagination::{
    clamp_items_per_page, clamp_sibling_count, DEFAULT_ITEMS_PER_PAGE, DEFAULT_SIBLING_COUNT,
};

/// Client configuration loaded from environment variables.
///
/// Every field except the database URL has a default suitable for local
/// development.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Postgres connection string. Required by the binary, unused by the
    /// in-memory backend.
    pub database_url: Option<String>,
    /// Maximum pool size (default: `20`).
    pub db_max_connections: u32,
    /// Dashboard page size (default: `10`), clamped to `1..=100`.
    pub items_per_page: usize,
    /// Page tokens shown on each side of the current page (default: `1`),
    /// clamped to `0..=10`.
    pub sibling_count: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 20,
            items_per_page: DEFAULT_ITEMS_PER_PAGE,
            sibling_count: DEFAULT_SIBLING_COUNT,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `DATABASE_URL`               | (none)  |
    /// | `QAFORUM_DB_MAX_CONNECTIONS` | `20`    |
    /// | `QAFORUM_PAGE_SIZE`          | `10`    |
    /// | `QAFORUM_SIBLING_COUNT`      | `1`     |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] but reading from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").filter(|url| !url.trim().is_empty());
        let db_max_connections = parse_var(
            &lookup,
            "QAFORUM_DB_MAX_CONNECTIONS",
            defaults.db_max_connections,
        )?;
        if db_max_connections == 0 {
            return Err(CoreError::Validation(
                "QAFORUM_DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        let items_per_page =
            clamp_items_per_page(parse_var(&lookup, "QAFORUM_PAGE_SIZE", defaults.items_per_page)?);
        let sibling_count = clamp_sibling_count(parse_var(
            &lookup,
            "QAFORUM_SIBLING_COUNT",
            defaults.sibling_count,
        )?);

        Ok(Self {
            database_url,
            db_max_connections,
            items_per_page,
            sibling_count,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| {
            CoreError::Validation(format!("{key} must be a non-negative integer, got {raw:?}"))
        }),
    }
}
