//! Pairing error types.

use crate::league::{PlayerId, Score};
use thiserror::Error;

/// Pairing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PairingError {
    /// Player pool is larger than the engine supports
    #[error("Too many players: {count} exceeds the maximum of {max}")]
    CapacityExceeded { count: usize, max: usize },

    /// The same player appears twice in the pool
    #[error("Player {0} appears more than once in the pool")]
    DuplicatePlayer(PlayerId),

    /// Backtracking found no legal pairing for a score group
    #[error("No legal pairing for round {round} in the score group led by {top_score} points: {players:?}")]
    UnpairableGroup {
        round: u32,
        top_score: Score,
        players: Vec<PlayerId>,
    },

    /// Every player has already met every other player
    #[error("All {rounds} round-robin rounds have been played")]
    RoundsExhausted { rounds: u32 },
}

/// Result type for pairing operations
pub type PairingResult<T> = Result<T, PairingError>;
