//! Rebuilds per-tournament player standings from stored games.

use super::models::{Color, Match, Player, PlayerId, Score};
use std::collections::BTreeMap;

/// Fold a tournament's matches into fresh player projections.
///
/// Only players in `roster` are returned, ordered by id. Opponents outside the
/// roster still count as faced. A bye credits a full win and records no color.
/// Undecided games record colors and opponents but no points.
pub fn players_from_matches<'a, I>(roster: &[PlayerId], matches: I) -> Vec<Player>
where
    I: IntoIterator<Item = &'a Match>,
{
    let mut players: BTreeMap<PlayerId, Player> =
        roster.iter().map(|id| (*id, Player::new(*id))).collect();

    let mut ordered: Vec<&Match> = matches.into_iter().collect();
    ordered.sort_by_key(|m| m.round);

    for m in ordered {
        let Some(black) = m.black else {
            if let Some(player) = players.get_mut(&m.white) {
                player.score += Score::WIN;
                player.had_bye = true;
            }
            continue;
        };

        for (id, opponent, color) in [(m.white, black, Color::White), (black, m.white, Color::Black)]
        {
            if let Some(player) = players.get_mut(&id) {
                player.opponents.insert(opponent);
                player.colors.push(color);
                if let Some(outcome) = m.outcome {
                    player.score += outcome.score_for(color);
                }
            }
        }
    }

    players.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::models::Outcome;

    fn decided(white: PlayerId, black: PlayerId, round: u32, outcome: Outcome) -> Match {
        Match {
            outcome: Some(outcome),
            ..Match::pairing(white, black, round)
        }
    }

    #[test]
    fn test_scores_and_colors_accumulate() {
        let matches = vec![
            decided(1, 2, 1, Outcome::WhiteWin),
            decided(3, 1, 2, Outcome::Draw),
            Match::bye(2, 2),
        ];

        let players = players_from_matches(&[1, 2, 3], &matches);
        assert_eq!(players.len(), 3);

        let p1 = &players[0];
        assert_eq!(p1.score, Score::from_half_points(3));
        assert_eq!(p1.colors, vec![Color::White, Color::Black]);
        assert!(p1.has_faced(2) && p1.has_faced(3));
        assert!(!p1.had_bye);

        let p2 = &players[1];
        assert_eq!(p2.score, Score::WIN);
        assert!(p2.had_bye);
        assert_eq!(p2.colors, vec![Color::Black]);

        let p3 = &players[2];
        assert_eq!(p3.score, Score::DRAW);
        assert_eq!(p3.colors, vec![Color::White]);
    }

    #[test]
    fn test_rounds_applied_in_order() {
        let matches = vec![
            decided(2, 1, 2, Outcome::BlackWin),
            decided(1, 2, 1, Outcome::Draw),
        ];

        let players = players_from_matches(&[1], &matches);
        assert_eq!(players[0].colors, vec![Color::White, Color::Black]);
        assert_eq!(players[0].score, Score::from_half_points(3));
    }

    #[test]
    fn test_undecided_game_counts_as_faced() {
        let matches = vec![Match::pairing(1, 2, 1)];
        let players = players_from_matches(&[1, 2], &matches);
        assert_eq!(players[0].score, Score::ZERO);
        assert!(players[0].has_faced(2));
        assert_eq!(players[1].colors, vec![Color::Black]);
    }

    #[test]
    fn test_players_outside_roster_are_skipped() {
        let matches = vec![decided(1, 99, 1, Outcome::BlackWin)];
        let players = players_from_matches(&[1], &matches);
        assert_eq!(players.len(), 1);
        assert!(players[0].has_faced(99));
    }
}
