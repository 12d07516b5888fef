//! Round-robin pairing with the circle method.
//!
//! Players sit in id order with a phantom seat added for odd pools. The first
//! seat stays put while the others rotate one place per round; board `i`
//! pairs seat `i` with seat `n - 1 - i`. Facing the phantom seat is a bye.

use super::{PairingError, PairingResult, PairingStrategy, check_pool};
use crate::league::{Match, Player, PlayerId};
use rand::RngCore;

/// Round-robin strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundRobinPairing;

impl PairingStrategy for RoundRobinPairing {
    fn next_round(
        &self,
        players: &[Player],
        rounds_so_far: u32,
        _rng: &mut dyn RngCore,
    ) -> PairingResult<Vec<Match>> {
        next_round(players, rounds_so_far)
    }
}

/// Number of rounds needed for everyone to meet everyone once
pub fn total_rounds(player_count: usize) -> u32 {
    let seats = player_count + player_count % 2;
    seats.saturating_sub(1) as u32
}

/// Pair round `rounds_so_far + 1` of a round-robin.
///
/// Scores and history are ignored; only the set of player ids matters.
///
/// # Errors
///
/// * `PairingError::CapacityExceeded` - More than 50 players
/// * `PairingError::RoundsExhausted` - Every pairing has already been played
pub fn next_round(players: &[Player], rounds_so_far: u32) -> PairingResult<Vec<Match>> {
    check_pool(players)?;

    let mut seats: Vec<Option<PlayerId>> = players.iter().map(|p| Some(p.id)).collect();
    if seats.is_empty() {
        return Ok(Vec::new());
    }
    seats.sort_unstable();
    if seats.len() % 2 == 1 {
        seats.push(None);
    }

    let rounds = total_rounds(players.len());
    if rounds_so_far >= rounds {
        return Err(PairingError::RoundsExhausted { rounds });
    }

    let n = seats.len();
    let shift = rounds_so_far as usize;
    seats[1..].rotate_right(shift % (n - 1));

    let round = rounds_so_far + 1;
    let matches = (0..n / 2)
        .filter_map(|board| {
            let home = seats[board];
            let away = seats[n - 1 - board];
            match (home, away) {
                (Some(a), Some(b)) if (board + shift) % 2 == 0 => Some(Match::pairing(a, b, round)),
                (Some(a), Some(b)) => Some(Match::pairing(b, a, round)),
                (Some(p), None) | (None, Some(p)) => Some(Match::bye(p, round)),
                (None, None) => None,
            }
        })
        .collect();

    Ok(matches)
}
