use core_config::{ConfigError, FromEnv, env_parse};
use std::time::Duration;

use crate::scoring::SemanticScale;

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    /// Upper bound on one embedding call before falling back to skill-only scoring
    pub embedding_timeout: Duration,
    pub semantic_scale: SemanticScale,
    /// Zero disables the match cache
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
    /// Concurrent embedding calls while preparing a candidate pool
    pub embedding_concurrency: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            embedding_timeout: Duration::from_millis(2000),
            semantic_scale: SemanticScale::Rescaled,
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(300),
            embedding_concurrency: 8,
        }
    }
}

impl FromEnv for MatchingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let embedding_concurrency = env_parse("MATCH_EMBEDDING_CONCURRENCY", defaults.embedding_concurrency)?;
        if embedding_concurrency == 0 {
            return Err(ConfigError::ParseError {
                key: "MATCH_EMBEDDING_CONCURRENCY".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            embedding_timeout: Duration::from_millis(env_parse("MATCH_EMBEDDING_TIMEOUT_MS", 2000u64)?),
            semantic_scale: env_parse("MATCH_SEMANTIC_SCALE", defaults.semantic_scale)?,
            cache_capacity: env_parse("MATCH_CACHE_CAPACITY", defaults.cache_capacity)?,
            cache_ttl: Duration::from_secs(env_parse("MATCH_CACHE_TTL_SECS", 300u64)?),
            embedding_concurrency,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 5] = [
        "MATCH_EMBEDDING_TIMEOUT_MS",
        "MATCH_SEMANTIC_SCALE",
        "MATCH_CACHE_CAPACITY",
        "MATCH_CACHE_TTL_SECS",
        "MATCH_EMBEDDING_CONCURRENCY",
    ];

    #[test]
    fn test_defaults_when_unset() {
        temp_env::with_vars_unset(KEYS, || {
            let config = MatchingConfig::from_env().unwrap();
            assert_eq!(config.embedding_timeout, Duration::from_millis(2000));
            assert_eq!(config.semantic_scale, SemanticScale::Rescaled);
            assert_eq!(config.cache_capacity, 10_000);
            assert_eq!(config.cache_ttl, Duration::from_secs(300));
        });
    }

    #[test]
    fn test_overrides() {
        temp_env::with_vars(
            [
                ("MATCH_EMBEDDING_TIMEOUT_MS", Some("150")),
                ("MATCH_SEMANTIC_SCALE", Some("clamped")),
                ("MATCH_CACHE_CAPACITY", Some("0")),
            ],
            || {
                let config = MatchingConfig::from_env().unwrap();
                assert_eq!(config.embedding_timeout, Duration::from_millis(150));
                assert_eq!(config.semantic_scale, SemanticScale::Clamped);
                assert_eq!(config.cache_capacity, 0);
            },
        );
    }

    #[test]
    fn test_invalid_scale_is_rejected() {
        temp_env::with_var("MATCH_SEMANTIC_SCALE", Some("cosine"), || {
            let err = MatchingConfig::from_env().unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { .. }));
        });
    }
}
