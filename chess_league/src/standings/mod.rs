//! Rankings: Buchholz tie-breaks, team standings and player tables.

pub mod aggregator;
pub mod manager;
pub mod tiebreak;

pub use aggregator::{TeamStanding, TournamentGames, compute_standings};
pub use manager::{PlayerStanding, StandingsManager};
pub use tiebreak::{full_buchholz, median_buchholz};
