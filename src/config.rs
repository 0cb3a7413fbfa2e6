use std::env;
use std::str::FromStr;

/// Default number of rows per page when the caller does not ask for one
pub const DEFAULT_PER_PAGE: u64 = 15;

/// Upper bound applied to caller supplied page sizes
pub const DEFAULT_MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub sqlx_logging: bool,

    // Repository
    pub repository: RepositoryConfig,
}

/// Settings shared by every repository handed out by the application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub per_page: u64,
    pub max_per_page: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            per_page: DEFAULT_PER_PAGE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if exists

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let repository = RepositoryConfig {
            per_page: parse_or(&lookup, "REPOSITORY_PER_PAGE", DEFAULT_PER_PAGE)?,
            max_per_page: parse_or(&lookup, "REPOSITORY_MAX_PER_PAGE", DEFAULT_MAX_PER_PAGE)?,
        };

        if repository.per_page == 0 {
            return Err(ConfigError::Invalid("REPOSITORY_PER_PAGE"));
        }
        if repository.max_per_page < repository.per_page {
            return Err(ConfigError::Invalid("REPOSITORY_MAX_PER_PAGE"));
        }

        Ok(Self {
            // Database
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 100)?,
            min_connections: parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 5)?,
            sqlx_logging: parse_or(&lookup, "DATABASE_SQLX_LOGGING", true)?,

            // Repository
            repository,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid environment variable: {0}")]
    Invalid(&'static str),
}
