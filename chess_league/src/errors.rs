//! League error types.

use crate::league::{EditionId, GameId, TournamentId, TournamentStatus};
use crate::pairing::PairingError;
use thiserror::Error;

/// Broad error category, for callers mapping failures onto responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvariantViolation,
    IncompleteRound,
    CapacityExceeded,
    UnpairableGroup,
    NotFound,
    InvalidInput,
    Storage,
}

/// League errors
#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("Tournament not found: {0}")]
    TournamentNotFound(TournamentId),

    #[error("Edition not found: {0}")]
    EditionNotFound(EditionId),

    #[error("Game not found: {0}")]
    GameNotFound(GameId),

    /// Only one tournament may be ongoing at a time
    #[error("Cannot activate tournament {requested}: tournament {ongoing} is already ongoing")]
    AnotherTournamentOngoing {
        requested: TournamentId,
        ongoing: TournamentId,
    },

    #[error("Tournament not in correct state: expected {expected}, got {actual}")]
    InvalidState {
        expected: TournamentStatus,
        actual: TournamentStatus,
    },

    #[error("Round {round} still has {pending} undecided game(s)")]
    IncompleteRound { round: u32, pending: usize },

    #[error("Game {0} is a bye and takes no result")]
    ByeHasNoOutcome(GameId),

    #[error("Pairing failed: {0}")]
    Pairing(#[from] PairingError),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LeagueError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LeagueError::TournamentNotFound(_)
            | LeagueError::EditionNotFound(_)
            | LeagueError::GameNotFound(_) => ErrorKind::NotFound,
            LeagueError::AnotherTournamentOngoing { .. } | LeagueError::InvalidState { .. } => {
                ErrorKind::InvariantViolation
            }
            LeagueError::IncompleteRound { .. } => ErrorKind::IncompleteRound,
            LeagueError::ByeHasNoOutcome(_) => ErrorKind::InvalidInput,
            LeagueError::Pairing(err) => match err {
                PairingError::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
                PairingError::UnpairableGroup { .. } => ErrorKind::UnpairableGroup,
                PairingError::DuplicatePlayer(_) | PairingError::RoundsExhausted { .. } => {
                    ErrorKind::InvalidInput
                }
            },
            LeagueError::CorruptRecord(_) | LeagueError::Database(_) => ErrorKind::Storage,
        }
    }

    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            LeagueError::Database(_) | LeagueError::CorruptRecord(_) => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for league operations
pub type LeagueResult<T> = Result<T, LeagueError>;
