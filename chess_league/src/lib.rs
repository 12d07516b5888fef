//! # Chess League
//!
//! Round-based chess league engine: Swiss and round-robin pairing, Buchholz
//! tie-breaks, cross-tournament team standings, and a tournament lifecycle
//! that guards round advancement under concurrent access.
//!
//! ## Architecture
//!
//! Pairing and standings are pure, synchronous computations over plain data.
//! The lifecycle orchestrates them against a [`db::LeagueStore`], running each
//! operation in one store transaction:
//!
//! - **Upcoming**: created, waiting to start
//! - **Ongoing**: rounds are paired and played; at most one tournament at a time
//! - **Finished**: terminal, round number frozen
//!
//! ## Core Modules
//!
//! - [`league`]: Entities and the game-history projection
//! - [`pairing`]: Pairing strategies (Swiss, round-robin)
//! - [`standings`]: Buchholz, team standings and player tables
//! - [`tournament`]: Lifecycle state machine
//! - [`db`]: Connection pool, store traits and implementations
//!
//! ## Example
//!
//! ```
//! use chess_league::db::InMemoryLeagueStore;
//! use chess_league::league::{Edition, Team, Tournament, TournamentType};
//! use chess_league::tournament::TournamentLifecycle;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), chess_league::LeagueError> {
//! let store = InMemoryLeagueStore::new();
//! store.insert_edition(Edition::new(1, "Spring".to_string())).await;
//! store
//!     .insert_team(Team::new(1, "Rooks".to_string()).with_player(1).with_player(2))
//!     .await;
//! store.join_edition(1, 1).await?;
//! store
//!     .insert_tournament(Tournament::new(1, 1, "Open".to_string(), TournamentType::Swiss))
//!     .await?;
//!
//! let lifecycle = TournamentLifecycle::with_seed(Arc::new(store), 7);
//! let report = lifecycle.activate(1).await?;
//! assert_eq!(report.tournament.current_round, Some(1));
//! assert_eq!(report.games.len(), 1);
//! # Ok(())
//! # }
//! ```

/// Persistence: connection pool and league stores.
pub mod db;

pub mod errors;
pub use errors::{ErrorKind, LeagueError, LeagueResult};

/// League entities and history projection.
pub mod league;

/// Round pairing strategies.
pub mod pairing;
pub use pairing::{MAX_PLAYERS, PairingError, PairingMethod, PairingStrategy};

pub mod standings;
pub use standings::{StandingsManager, TeamStanding, compute_standings};

pub mod tournament;
pub use tournament::{RoundReport, TournamentLifecycle};
