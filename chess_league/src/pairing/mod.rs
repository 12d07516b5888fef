//! Round pairing strategies.
//!
//! Every tournament type pairs through the same [`PairingStrategy`] contract:
//! given the players' current projections and the number of rounds already
//! played, produce the next round's matches or fail without emitting any.
//! [`PairingMethod`] dispatches to the concrete strategy with `enum_dispatch`.
//!
//! ## Example
//!
//! ```
//! use chess_league::league::Player;
//! use chess_league::pairing::{PairingMethod, PairingStrategy, SwissPairing};
//! use rand::{SeedableRng, rngs::StdRng};
//!
//! let players: Vec<Player> = (1..=4).map(Player::new).collect();
//! let mut rng = StdRng::seed_from_u64(1);
//!
//! let method = PairingMethod::from(SwissPairing);
//! let matches = method.next_round(&players, 0, &mut rng).unwrap();
//! assert_eq!(matches.len(), 2);
//! assert!(matches.iter().all(|m| m.round == 1));
//! ```

pub mod errors;
pub mod round_robin;
pub mod swiss;

use crate::league::{Match, Player, TournamentType};
use enum_dispatch::enum_dispatch;
use rand::RngCore;
use std::collections::HashSet;

pub use errors::{PairingError, PairingResult};
pub use round_robin::RoundRobinPairing;
pub use swiss::SwissPairing;

/// Largest player pool a round can be generated for
pub const MAX_PLAYERS: usize = 50;

/// Produces one round of matches from the current player projections
#[enum_dispatch]
pub trait PairingStrategy {
    /// Pair round `rounds_so_far + 1`.
    ///
    /// # Errors
    ///
    /// * `PairingError::CapacityExceeded` - More than [`MAX_PLAYERS`] players
    /// * `PairingError::UnpairableGroup` - No legal pairing exists under the strategy's rules
    fn next_round(
        &self,
        players: &[Player],
        rounds_so_far: u32,
        rng: &mut dyn RngCore,
    ) -> PairingResult<Vec<Match>>;
}

/// Pairing strategy selected by tournament type
#[enum_dispatch(PairingStrategy)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairingMethod {
    SwissPairing,
    RoundRobinPairing,
}

impl From<TournamentType> for PairingMethod {
    fn from(kind: TournamentType) -> Self {
        match kind {
            TournamentType::Swiss => SwissPairing.into(),
            TournamentType::RoundRobin => RoundRobinPairing.into(),
        }
    }
}

/// Reject pools that are too large or contain the same player twice
pub(crate) fn check_pool(players: &[Player]) -> PairingResult<()> {
    if players.len() > MAX_PLAYERS {
        return Err(PairingError::CapacityExceeded {
            count: players.len(),
            max: MAX_PLAYERS,
        });
    }

    let mut seen = HashSet::with_capacity(players.len());
    for player in players {
        if !seen.insert(player.id) {
            return Err(PairingError::DuplicatePlayer(player.id));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn test_method_from_tournament_type() {
        assert_eq!(
            PairingMethod::from(TournamentType::Swiss),
            PairingMethod::SwissPairing(SwissPairing)
        );
        assert_eq!(
            PairingMethod::from(TournamentType::RoundRobin),
            PairingMethod::RoundRobinPairing(RoundRobinPairing)
        );
    }

    #[test]
    fn test_capacity_checked_by_every_method() {
        let players: Vec<Player> = (1..=51).map(Player::new).collect();
        let mut rng = StdRng::seed_from_u64(3);

        for kind in [TournamentType::Swiss, TournamentType::RoundRobin] {
            let err = PairingMethod::from(kind)
                .next_round(&players, 0, &mut rng)
                .unwrap_err();
            assert_eq!(
                err,
                PairingError::CapacityExceeded {
                    count: 51,
                    max: MAX_PLAYERS
                }
            );
        }
    }

    #[test]
    fn test_duplicate_player_rejected() {
        let players = vec![Player::new(1), Player::new(2), Player::new(1)];
        assert_eq!(
            check_pool(&players),
            Err(PairingError::DuplicatePlayer(1))
        );
    }

    #[test]
    fn test_exactly_max_players_accepted() {
        let players: Vec<Player> = (1..=MAX_PLAYERS as i64).map(Player::new).collect();
        assert!(check_pool(&players).is_ok());
    }
}
