use crate::{ConfigError, FromEnv, env_optional, env_parse, env_required};
use std::time::Duration;

/// PostgreSQL connection and pool settings.
///
/// Persistence is optional for the matchmaker: use [`DatabaseConfig::from_env_optional`]
/// to get `None` when `DATABASE_URL` is not configured.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub acquire_timeout: Duration,
    /// Attempts made by the startup connector before giving up.
    pub connect_retries: u32,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 20,
            min_connections: 2,
            connect_timeout: Duration::from_secs(8),
            acquire_timeout: Duration::from_secs(8),
            connect_retries: 5,
        }
    }

    /// Like `from_env`, but a missing `DATABASE_URL` yields `Ok(None)`.
    pub fn from_env_optional() -> Result<Option<Self>, ConfigError> {
        match env_optional("DATABASE_URL") {
            Some(_) => Self::from_env().map(Some),
            None => Ok(None),
        }
    }
}

impl FromEnv for DatabaseConfig {
    /// - DATABASE_URL (required)
    /// - DB_MAX_CONNECTIONS (default 20), DB_MIN_CONNECTIONS (default 2)
    /// - DB_CONNECT_TIMEOUT_SECS / DB_ACQUIRE_TIMEOUT_SECS (default 8)
    /// - DB_CONNECT_RETRIES (default 5)
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::new(env_required("DATABASE_URL")?);

        Ok(Self {
            max_connections: env_parse("DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout: Duration::from_secs(env_parse("DB_CONNECT_TIMEOUT_SECS", 8u64)?),
            acquire_timeout: Duration::from_secs(env_parse("DB_ACQUIRE_TIMEOUT_SECS", 8u64)?),
            connect_retries: env_parse("DB_CONNECT_RETRIES", defaults.connect_retries)?,
            ..defaults
        })
    }
}
