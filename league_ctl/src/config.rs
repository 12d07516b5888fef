//! Command line configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chess_league::db::{DatabaseConfig, DatabaseConfigError};

/// Complete configuration loaded from the environment and CLI flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtlConfig {
    /// Database configuration
    pub database: DatabaseConfig,
    /// Seed for color tie-breaks; `None` seeds from the OS
    pub pairing_seed: Option<u64>,
    /// Print results as JSON instead of tables
    pub json_output: bool,
}

impl CtlConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `database_url_override` - Database URL from `--db-url`
    /// * `seed_override` - Pairing seed from `--seed`
    /// * `json_flag` - Whether `--json` was given
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        database_url_override: Option<String>,
        seed_override: Option<u64>,
        json_flag: bool,
    ) -> Result<Self, ConfigError> {
        let database_url = database_url_override
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "DATABASE_URL".to_string(),
                hint: "Pass --db-url or set it in .env".to_string(),
            })?;
        let database = DatabaseConfig::from_env_with_url(database_url)?;

        let pairing_seed = match seed_override {
            Some(seed) => Some(seed),
            None => parse_optional_env("PAIRING_SEED")?,
        };

        let json_output = json_flag || parse_optional_env("LEAGUE_JSON_OUTPUT")?.unwrap_or(false);

        Ok(CtlConfig {
            database,
            pairing_seed,
            json_output,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = &self.database.database_url;
        if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
            return Err(ConfigError::Invalid {
                var: "DATABASE_URL".to_string(),
                reason: "Must be a postgres:// connection string".to_string(),
            });
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid {
                var: "DB_MAX_CONNECTIONS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid {
                var: "DB_MIN_CONNECTIONS".to_string(),
                reason: format!(
                    "Cannot exceed max connections ({})",
                    self.database.max_connections
                ),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },

    #[error(transparent)]
    Database(#[from] DatabaseConfigError),
}

/// Parse an optional variable, rejecting values that are set but malformed
fn parse_optional_env<T>(key: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map(Some).map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("Cannot parse '{value}'"),
        }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config(database_url: &str) -> CtlConfig {
        CtlConfig {
            database: DatabaseConfig {
                database_url: database_url.to_string(),
                ..DatabaseConfig::development()
            },
            pairing_seed: None,
            json_output: false,
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "DATABASE_URL".to_string(),
            hint: "Pass --db-url".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("DATABASE_URL"));
        assert!(msg.contains("Pass --db-url"));
    }

    #[test]
    fn test_validation_accepts_development_defaults() {
        assert!(config("postgres://postgres@localhost/chess_league").validate().is_ok());
        assert!(config("postgresql://localhost/league").validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_other_schemes() {
        let err = config("mysql://localhost/league").validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DATABASE_URL"));
    }

    #[test]
    fn test_validation_rejects_inverted_pool_bounds() {
        let mut config = config("postgres://localhost/league");
        config.database.min_connections = 20;
        config.database.max_connections = 5;

        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "DB_MIN_CONNECTIONS"));
    }

    #[test]
    #[serial]
    fn test_overrides_take_precedence() {
        let config =
            CtlConfig::from_env(Some("postgres://cli/league".to_string()), Some(17), true).unwrap();
        assert_eq!(config.database.database_url, "postgres://cli/league");
        assert_eq!(config.pairing_seed, Some(17));
        assert!(config.json_output);
    }

    #[test]
    #[serial]
    fn test_unset_optional_variable() {
        let seed: Option<u64> = parse_optional_env("LEAGUE_CTL_TEST_UNSET_SEED").unwrap();
        assert_eq!(seed, None);
    }

    #[test]
    #[serial]
    fn test_malformed_json_flag_is_rejected() {
        // SAFETY: env mutation is serialized with the other env tests
        unsafe { std::env::set_var("LEAGUE_JSON_OUTPUT", "yes") };
        let result = CtlConfig::from_env(Some("postgres://cli/league".to_string()), None, false);
        unsafe { std::env::remove_var("LEAGUE_JSON_OUTPUT") };

        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref var, .. } if var == "LEAGUE_JSON_OUTPUT"));
    }

    #[test]
    #[serial]
    fn test_json_flag_from_env() {
        // SAFETY: env mutation is serialized with the other env tests
        unsafe { std::env::set_var("LEAGUE_JSON_OUTPUT", "true") };
        let result = CtlConfig::from_env(Some("postgres://cli/league".to_string()), None, false);
        unsafe { std::env::remove_var("LEAGUE_JSON_OUTPUT") };

        assert!(result.unwrap().json_output);
    }
}
