//! Database module providing PostgreSQL connection pooling and the league stores.
//!
//! The connection pool is managed with sqlx; the [`LeagueStore`] trait is the
//! seam between the lifecycle and persistence, with a PostgreSQL and an
//! in-memory implementation.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod config;
pub mod memory;
pub mod repository;

pub use config::{DatabaseConfig, DatabaseConfigError};
pub use memory::InMemoryLeagueStore;
pub use repository::{LeagueStore, LeagueTransaction, PgLeagueStore};

/// Tables the PostgreSQL store reads and writes
pub const LEAGUE_TABLES: &[&str] = &[
    "editions",
    "edition_teams",
    "team_members",
    "tournaments",
    "games",
];

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chess_league::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let config = DatabaseConfig::from_env()?;
    ///     let db = Database::new(&config).await?;
    ///     assert!(db.missing_tables().await?.is_empty());
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// League tables absent from the connected database, in [`LEAGUE_TABLES`]
    /// order. An empty list means the schema is in place.
    pub async fn missing_tables(&self) -> Result<Vec<&'static str>, sqlx::Error> {
        let mut missing = Vec::new();
        for &table in LEAGUE_TABLES {
            let present: bool = sqlx::query_scalar("SELECT to_regclass($1) IS NOT NULL")
                .bind(table)
                .fetch_one(&self.pool)
                .await?;
            if !present {
                missing.push(table);
            }
        }
        Ok(missing)
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires a PostgreSQL instance at DATABASE_URL"]
    async fn test_database_connection() {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://postgres@localhost/chess_league_test".to_string());

        let config = DatabaseConfig {
            database_url,
            max_connections: 5,
            min_connections: 1,
            connection_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        };

        let db = Database::new(&config)
            .await
            .expect("Failed to connect to database");
        let missing = db.missing_tables().await.expect("Schema check failed");
        assert!(missing.is_empty(), "missing tables: {missing:?}");
        db.close().await;
    }
}
