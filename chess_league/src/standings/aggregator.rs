//! Team standings across the tournaments of an edition.
//!
//! Small points reward individual games (2 for a win, 1 for a draw). Big
//! points reward each tournament's team ranking: with `n` teams in the
//! edition, a team ranked `r` earns `n - r + 1`, where `r` is one more than
//! the number of teams that scored strictly more small points in that
//! tournament.

use crate::league::{Color, Game, TeamId, TournamentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A team's standing within an edition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub team_id: TeamId,
    pub small_points: u32,
    pub big_points: u32,
}

/// Games of one tournament, as handed to [`compute_standings`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentGames {
    pub tournament_id: TournamentId,
    pub games: Vec<Game>,
}

/// Small points per edition team for the given games.
///
/// Every edition team appears, with zero if it played nothing. Undecided
/// games and sides without an edition team are skipped.
fn small_points<'a, I>(teams: &[TeamId], games: I) -> BTreeMap<TeamId, u32>
where
    I: IntoIterator<Item = &'a Game>,
{
    let mut points: BTreeMap<TeamId, u32> = teams.iter().map(|t| (*t, 0)).collect();

    for game in games {
        let Some(outcome) = game.pairing.outcome else {
            continue;
        };
        let sides = [
            (game.pairing.white_team, Color::White),
            (game.pairing.black_team, Color::Black),
        ];
        for (team, color) in sides {
            if let Some(total) = team.and_then(|t| points.get_mut(&t)) {
                *total += outcome.score_for(color).half_points();
            }
        }
    }

    points
}

/// Competition-ranking points for one tournament
fn big_points(tournament_scores: &BTreeMap<TeamId, u32>, team_count: u32) -> BTreeMap<TeamId, u32> {
    tournament_scores
        .iter()
        .map(|(team, score)| {
            let better = tournament_scores.values().filter(|s| *s > score).count() as u32;
            let rank = better + 1;
            (*team, team_count - rank + 1)
        })
        .collect()
}

/// Rank the teams of an edition over all of its tournaments.
///
/// `teams` are the teams joined to the edition; their count fixes the points
/// for first place in every tournament. Ordered by big points, then small
/// points, then team id.
pub fn compute_standings(teams: &[TeamId], tournaments: &[TournamentGames]) -> Vec<TeamStanding> {
    let mut teams = teams.to_vec();
    teams.sort_unstable();
    teams.dedup();
    let team_count = teams.len() as u32;

    let mut standings: BTreeMap<TeamId, TeamStanding> = teams
        .iter()
        .map(|t| {
            (
                *t,
                TeamStanding {
                    team_id: *t,
                    small_points: 0,
                    big_points: 0,
                },
            )
        })
        .collect();

    for tournament in tournaments {
        let scores = small_points(&teams, &tournament.games);
        let ranking = big_points(&scores, team_count);

        for (team, standing) in standings.iter_mut() {
            standing.small_points += scores.get(team).copied().unwrap_or_default();
            standing.big_points += ranking.get(team).copied().unwrap_or_default();
        }
    }

    let mut ordered: Vec<TeamStanding> = standings.into_values().collect();
    ordered.sort_by(|a, b| {
        b.big_points
            .cmp(&a.big_points)
            .then(b.small_points.cmp(&a.small_points))
            .then(a.team_id.cmp(&b.team_id))
    });
    ordered
}
