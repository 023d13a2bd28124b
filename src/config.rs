use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;
use url::Url;

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:5000";
const DEFAULT_HH_API_URL: &str = "https://api.hh.ru/vacancies";
const DEFAULT_USER_AGENT: &str = "vacancy-search/0.1";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub store: StoreConfig,
    pub source: SourceConfig,
}

/// Connection settings for the PostgreSQL store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "db".to_string(),
            port: 5432,
            database: "vacancies".to_string(),
            user: "postgres".to_string(),
            password: "1234".to_string(),
            max_connections: 10,
        }
    }
}

/// Settings for the external job-posting API.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_HH_API_URL).expect("default API URL is valid"),
            token: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let defaults = StoreConfig::default();
        let store = StoreConfig {
            database_url: get_env_opt("DATABASE_URL"),
            host: get_env_or("DB_HOST", &defaults.host),
            port: get_env_parse_or("DB_PORT", defaults.port)?,
            database: get_env_or("DB_NAME", &defaults.database),
            user: get_env_or("DB_USER", &defaults.user),
            password: get_env_or("DB_PASSWORD", &defaults.password),
            max_connections: get_env_parse_or("DB_MAX_CONNECTIONS", defaults.max_connections)?,
        };

        let raw_url = get_env_or("HH_API_URL", DEFAULT_HH_API_URL);
        let base_url = Url::parse(&raw_url)
            .map_err(|e| Error::Config(format!("Invalid value for HH_API_URL: {}", e)))?;

        let source = SourceConfig {
            base_url,
            token: get_env_opt("HH_API_TOKEN"),
            user_agent: get_env_or("HH_USER_AGENT", DEFAULT_USER_AGENT),
            timeout: Duration::from_secs(get_env_parse_or("HH_TIMEOUT_SECS", 30u64)?),
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            store,
            source,
        })
    }
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_defaults_target_local_compose_database() {
        let store = StoreConfig::default();
        assert_eq!(store.host, "db");
        assert_eq!(store.database, "vacancies");
        assert_eq!(store.port, 5432);
        assert!(store.database_url.is_none());
    }

    #[test]
    fn source_defaults_point_at_hh() {
        let source = SourceConfig::default();
        assert_eq!(source.base_url.as_str(), DEFAULT_HH_API_URL);
        assert!(source.token.is_none());
        assert_eq!(source.timeout, Duration::from_secs(30));
    }

    #[test]
    fn unparsable_numbers_are_config_errors() {
        env::set_var("VACANCY_SEARCH_TEST_PORT", "not-a-port");
        let result: Result<u16> = get_env_parse_or("VACANCY_SEARCH_TEST_PORT", 5432);
        assert!(matches!(result, Err(Error::Config(_))));
        env::remove_var("VACANCY_SEARCH_TEST_PORT");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        env::set_var("VACANCY_SEARCH_TEST_BLANK", "   ");
        assert_eq!(get_env_or("VACANCY_SEARCH_TEST_BLANK", "fallback"), "fallback");
        env::remove_var("VACANCY_SEARCH_TEST_BLANK");
    }
}
