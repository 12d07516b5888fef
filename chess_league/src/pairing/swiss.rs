//! Swiss-system pairing engine.
//!
//! Players are ranked by score (ties by id), an odd pool hands a bye to the
//! lowest-ranked player without one, and the rest are split into score
//! groups. Odd groups float their lowest-ranked player down into the next
//! group, then every group is paired by backtracking under three rules:
//!
//! - no rematches,
//! - nobody plays the same color three times running,
//! - White goes to the side with the lower color balance, then the lower
//!   white count, then a coin flip.
//!
//! Floating is a single greedy pass rather than a global matching, so a group
//! can fail even though some other grouping would have paired. That surfaces
//! as [`PairingError::UnpairableGroup`] and no matches are produced. The
//! same error is returned when a group's search runs past its node limit.

use super::{PairingError, PairingResult, PairingStrategy, check_pool};
use crate::league::{Color, Match, Player, PlayerId};
use rand::{Rng, RngCore};
use std::{cmp::Ordering, collections::HashSet};

/// Swiss-system strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwissPairing;

impl PairingStrategy for SwissPairing {
    fn next_round(
        &self,
        players: &[Player],
        rounds_so_far: u32,
        rng: &mut dyn RngCore,
    ) -> PairingResult<Vec<Match>> {
        next_round(players, rounds_so_far, rng)
    }
}

/// Pair round `rounds_so_far + 1` of a Swiss tournament.
///
/// The bye match, if any, comes first, followed by the score groups from the
/// top down.
///
/// # Errors
///
/// * `PairingError::CapacityExceeded` - More than 50 players
/// * `PairingError::DuplicatePlayer` - A player id appears twice
/// * `PairingError::UnpairableGroup` - Some score group has no legal pairing
pub fn next_round<R: Rng + ?Sized>(
    players: &[Player],
    rounds_so_far: u32,
    rng: &mut R,
) -> PairingResult<Vec<Match>> {
    check_pool(players)?;
    let round = rounds_so_far + 1;

    let mut ranked: Vec<&Player> = players.iter().collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.id.cmp(&b.id)));

    let mut matches = Vec::with_capacity(ranked.len() / 2 + 1);

    if ranked.len() % 2 == 1 {
        let recipient = ranked.remove(bye_index(&ranked));
        matches.push(Match::bye(recipient.id, round));
    }

    for group in float_odd_players(score_groups(&ranked)) {
        let pairs = pair_group(&group, rng).ok_or_else(|| PairingError::UnpairableGroup {
            round,
            top_score: group[0].score,
            players: group.iter().map(|p| p.id).collect(),
        })?;

        matches.extend(
            pairs
                .into_iter()
                .map(|(white, black)| Match::pairing(white, black, round)),
        );
    }

    Ok(matches)
}

/// Lowest-ranked player without a bye, else the lowest-ranked player
fn bye_index(ranked: &[&Player]) -> usize {
    ranked
        .iter()
        .rposition(|p| !p.had_bye)
        .unwrap_or(ranked.len() - 1)
}

/// Split an already ranked pool into runs of identical score
fn score_groups<'a>(ranked: &[&'a Player]) -> Vec<Vec<&'a Player>> {
    let mut groups: Vec<Vec<&'a Player>> = Vec::new();

    for &player in ranked {
        match groups.last_mut() {
            Some(group) if group[0].score == player.score => group.push(player),
            _ => groups.push(vec![player]),
        }
    }

    groups
}

/// Move the lowest-ranked player of each odd group to the head of the next
fn float_odd_players(mut groups: Vec<Vec<&Player>>) -> Vec<Vec<&Player>> {
    for i in 0..groups.len() {
        if groups[i].len() % 2 == 0 {
            continue;
        }
        let Some(floater) = groups[i].pop() else {
            continue;
        };
        match groups.get_mut(i + 1) {
            Some(next) => next.insert(0, floater),
            None => groups.push(vec![floater]),
        }
    }

    groups.retain(|group| !group.is_empty());
    groups
}

/// Search nodes one group may visit before it is reported unpairable
const SEARCH_NODE_LIMIT: usize = 100_000;

/// Pair a whole group, returning `(white, black)` ids in board order
fn pair_group<R: Rng + ?Sized>(group: &[&Player], rng: &mut R) -> Option<Vec<(PlayerId, PlayerId)>> {
    debug_assert!(group.len() < 64);

    // Two players who may only take the same color can never meet.
    let half = group.len() / 2;
    let black_only = group
        .iter()
        .filter(|p| p.would_repeat_thrice(Color::White))
        .count();
    let white_only = group
        .iter()
        .filter(|p| p.would_repeat_thrice(Color::Black))
        .count();
    if black_only > half || white_only > half {
        return None;
    }

    let mut search = GroupSearch::new(group);
    let everyone = (1u64 << group.len()) - 1;

    let mut pairs = search.run(everyone, rng)?;
    pairs.reverse();
    Some(pairs)
}

/// Backtracking state for one score group.
///
/// Bit `i` of a mask stands for `group[i]`; lower bits rank higher, so the
/// lowest set bit is the top remaining player and candidates are tried in
/// rank order.
struct GroupSearch<'g, 'p> {
    group: &'g [&'p Player],
    /// `partners[i]` holds everyone `group[i]` may still legally meet
    partners: Vec<u64>,
    /// Subsets proven unpairable; color choices never change the answer
    dead_ends: HashSet<u64>,
    nodes_left: usize,
}

impl<'g, 'p> GroupSearch<'g, 'p> {
    fn new(group: &'g [&'p Player]) -> Self {
        let partners = group
            .iter()
            .map(|a| {
                group
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| a.id != b.id && can_meet(a, b))
                    .fold(0u64, |mask, (j, _)| mask | (1 << j))
            })
            .collect();

        Self {
            group,
            partners,
            dead_ends: HashSet::new(),
            nodes_left: SEARCH_NODE_LIMIT,
        }
    }

    /// Some player in `remaining` has nobody left to play
    fn has_stranded(&self, remaining: u64) -> bool {
        let mut bits = remaining;
        while bits != 0 {
            let i = bits.trailing_zeros() as usize;
            bits &= bits - 1;
            if self.partners[i] & remaining == 0 {
                return true;
            }
        }
        false
    }

    fn run<R: Rng + ?Sized>(
        &mut self,
        remaining: u64,
        rng: &mut R,
    ) -> Option<Vec<(PlayerId, PlayerId)>> {
        if remaining == 0 {
            return Some(Vec::new());
        }
        if self.nodes_left == 0 || self.dead_ends.contains(&remaining) {
            return None;
        }
        self.nodes_left -= 1;

        if self.has_stranded(remaining) {
            self.dead_ends.insert(remaining);
            return None;
        }

        let top = remaining.trailing_zeros() as usize;
        let rest = remaining & !(1 << top);

        let mut candidates = rest & self.partners[top];
        while candidates != 0 {
            let idx = candidates.trailing_zeros() as usize;
            candidates &= candidates - 1;

            let Some(colors) = assign_colors(self.group[top], self.group[idx], rng) else {
                continue;
            };

            if let Some(mut pairs) = self.run(rest & !(1 << idx), rng) {
                pairs.push(colors);
                return Some(pairs);
            }
            if self.nodes_left == 0 {
                return None;
            }
        }

        self.dead_ends.insert(remaining);
        None
    }
}

/// No rematch and at least one legal color orientation
fn can_meet(a: &Player, b: &Player) -> bool {
    let (a_white_ok, b_white_ok) = legal_orientations(a, b);
    !a.has_faced(b.id) && !b.has_faced(a.id) && (a_white_ok || b_white_ok)
}

/// Whether `a` may take White, and whether `b` may, without anyone playing
/// a third consecutive game in the same color
fn legal_orientations(a: &Player, b: &Player) -> (bool, bool) {
    (
        !a.would_repeat_thrice(Color::White) && !b.would_repeat_thrice(Color::Black),
        !b.would_repeat_thrice(Color::White) && !a.would_repeat_thrice(Color::Black),
    )
}

/// Decide who plays White, or `None` when every orientation gives someone a
/// third consecutive game in the same color.
fn assign_colors<R: Rng + ?Sized>(
    a: &Player,
    b: &Player,
    rng: &mut R,
) -> Option<(PlayerId, PlayerId)> {
    let a_gets_white = match legal_orientations(a, b) {
        (false, false) => return None,
        (true, false) => true,
        (false, true) => false,
        (true, true) => {
            let a_key = (a.color_balance(), a.white_count());
            let b_key = (b.color_balance(), b.white_count());
            match a_key.cmp(&b_key) {
                Ordering::Less => true,
                Ordering::Greater => false,
                Ordering::Equal => rng.random_bool(0.5),
            }
        }
    };

    Some(if a_gets_white {
        (a.id, b.id)
    } else {
        (b.id, a.id)
    })
}
