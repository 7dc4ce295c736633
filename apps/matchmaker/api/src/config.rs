use core_config::{
    AppInfo, ConfigError, FromEnv, app_info, database::DatabaseConfig, env_optional,
    server::ServerConfig,
};
use domain_connections::NotifierConfig;
use domain_matching::{MatchingConfig, OpenAIConfig};

pub use core_config::Environment;

/// Application configuration, composed from the shared config components.
///
/// Only the server settings have required parts in production; everything
/// else degrades: no `DATABASE_URL` keeps connection requests in memory, no
/// `OPENAI_API_KEY` scores on skills alone, no `NOTIFY_WEBHOOK_URL` logs events.
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub database: Option<DatabaseConfig>,
    pub matching: MatchingConfig,
    pub openai: Option<OpenAIConfig>,
    pub notifier: NotifierConfig,
    /// JSON file with startups, talent, investors and jobs (`PROFILE_FIXTURES_PATH`)
    pub fixtures_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app: app_info!(),
            server: ServerConfig::from_env()?,
            environment: Environment::from_env(),
            database: DatabaseConfig::from_env_optional()?,
            matching: MatchingConfig::from_env()?,
            openai: OpenAIConfig::from_env()?,
            notifier: NotifierConfig::from_env()?,
            fixtures_path: env_optional("PROFILE_FIXTURES_PATH"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_everything_optional_but_server() {
        temp_env::with_vars_unset(
            [
                "DATABASE_URL",
                "OPENAI_API_KEY",
                "NOTIFY_WEBHOOK_URL",
                "PROFILE_FIXTURES_PATH",
                "PORT",
            ],
            || {
                let config = Config::from_env().unwrap();
                assert!(config.database.is_none());
                assert!(config.openai.is_none());
                assert!(config.notifier.webhook_url.is_none());
                assert_eq!(config.server.port, 8080);
            },
        );
    }

    #[test]
    fn test_bad_port_is_rejected() {
        temp_env::with_var("PORT", Some("eighty"), || {
            assert!(Config::from_env().is_err());
        });
    }
}
