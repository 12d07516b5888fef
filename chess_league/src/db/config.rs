//! Database configuration module.
//!
//! Provides configuration structures for database connection management.

use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while reading database configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DatabaseConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub database_url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,

    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout_secs: u64,

    /// Maximum connection lifetime in seconds
    pub max_lifetime_secs: u64,
}

/// Read `name`, falling back to `default` when unset
fn var_or<T: FromStr>(
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, DatabaseConfigError> {
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| DatabaseConfigError::Invalid {
            name,
            expected,
            value,
        }),
        Err(_) => Ok(default),
    }
}

impl DatabaseConfig {
    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `DATABASE_URL`: PostgreSQL connection string
    /// - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
    /// - `DB_MIN_CONNECTIONS`: Minimum pool size (default: 1)
    /// - `DB_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 10)
    /// - `DB_IDLE_TIMEOUT`: Idle timeout in seconds (default: 600)
    /// - `DB_MAX_LIFETIME`: Max lifetime in seconds (default: 1800)
    ///
    /// # Errors
    ///
    /// * `DatabaseConfigError::Missing` - `DATABASE_URL` is not set
    /// * `DatabaseConfigError::Invalid` - A numeric variable does not parse
    pub fn from_env() -> Result<Self, DatabaseConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| DatabaseConfigError::Missing("DATABASE_URL"))?;
        Self::from_env_with_url(database_url)
    }

    /// Like [`DatabaseConfig::from_env`], but with the URL supplied by the caller
    pub fn from_env_with_url(database_url: String) -> Result<Self, DatabaseConfigError> {
        Ok(Self {
            database_url,
            max_connections: var_or("DB_MAX_CONNECTIONS", 10, "u32")?,
            min_connections: var_or("DB_MIN_CONNECTIONS", 1, "u32")?,
            connection_timeout_secs: var_or("DB_CONNECTION_TIMEOUT", 10, "u64")?,
            idle_timeout_secs: var_or("DB_IDLE_TIMEOUT", 600, "u64")?,
            max_lifetime_secs: var_or("DB_MAX_LIFETIME", 1800, "u64")?,
        })
    }

    /// Create a default configuration for development
    ///
    /// Uses `postgres://postgres@localhost/chess_league` as the database URL
    pub fn development() -> Self {
        Self {
            database_url: "postgres://postgres@localhost/chess_league".to_string(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::development()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let config = DatabaseConfig::default();
        assert_eq!(config, DatabaseConfig::development());
        assert!(config.min_connections <= config.max_connections);
        assert!(config.database_url.starts_with("postgres://"));
    }

    #[test]
    fn test_var_or_uses_default_when_unset() {
        let value: u32 = var_or("CHESS_LEAGUE_TEST_UNSET_VARIABLE", 7, "u32").unwrap();
        assert_eq!(value, 7);
    }

    #[test]
    fn test_error_messages() {
        let err = DatabaseConfigError::Invalid {
            name: "DB_MAX_CONNECTIONS",
            expected: "u32",
            value: "many".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "DB_MAX_CONNECTIONS must be a valid u32, got 'many'"
        );
        assert_eq!(
            DatabaseConfigError::Missing("DATABASE_URL").to_string(),
            "DATABASE_URL must be set"
        );
    }
}
