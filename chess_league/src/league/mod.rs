//! League entities and the history projection used for pairing.
//!
//! Entities are plain records: players are projected per tournament from
//! stored games, while tournaments, teams and editions come from the store.

pub mod history;
pub mod models;

pub use history::players_from_matches;
pub use models::{
    Color, Edition, EditionId, Game, GameId, Match, Outcome, Player, PlayerId, RosterEntry, Score,
    Team, TeamId, TeamMember, Tournament, TournamentId, TournamentStatus, TournamentType,
};
