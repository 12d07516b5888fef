//! Buchholz tie-breaks.

use crate::league::{Player, PlayerId, Score};

/// Scores of the opponents `target` has faced, in pool order
fn opponent_scores(players: &[Player], target: PlayerId) -> Vec<Score> {
    let Some(subject) = players.iter().find(|p| p.id == target) else {
        return Vec::new();
    };

    players
        .iter()
        .filter(|p| p.id != target && subject.has_faced(p.id))
        .map(|p| p.score)
        .collect()
}

/// Sum of the scores of every opponent `target` has faced.
///
/// Opponents missing from `players` contribute nothing; an unknown target
/// scores zero.
pub fn full_buchholz(players: &[Player], target: PlayerId) -> Score {
    opponent_scores(players, target).into_iter().sum()
}

/// Buchholz with the single best and single worst opponent removed.
///
/// With two opponents or fewer nothing is removed.
pub fn median_buchholz(players: &[Player], target: PlayerId) -> Score {
    let mut scores = opponent_scores(players, target);
    if scores.len() <= 2 {
        return scores.into_iter().sum();
    }

    scores.sort_unstable();
    scores[1..scores.len() - 1].iter().copied().sum()
}
