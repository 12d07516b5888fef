//! Store-backed standings queries.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::aggregator::{TeamStanding, TournamentGames, compute_standings};
use super::tiebreak::{full_buchholz, median_buchholz};
use crate::db::LeagueStore;
use crate::errors::{LeagueError, LeagueResult};
use crate::league::{EditionId, PlayerId, Score, TournamentId, players_from_matches};

/// One row of a tournament's player table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub score: Score,
    pub buchholz: Score,
    pub median_buchholz: Score,
    pub had_bye: bool,
}

/// Reads league data and ranks teams and players
#[derive(Clone)]
pub struct StandingsManager {
    store: Arc<dyn LeagueStore>,
}

impl StandingsManager {
    pub fn new(store: Arc<dyn LeagueStore>) -> Self {
        Self { store }
    }

    /// Team standings of an edition over every one of its tournaments
    ///
    /// # Errors
    ///
    /// * `LeagueError::EditionNotFound` - Unknown edition
    pub async fn compute_standings(&self, edition: EditionId) -> LeagueResult<Vec<TeamStanding>> {
        let mut tx = self.store.begin().await?;

        let teams = tx
            .edition_teams(edition)
            .await?
            .ok_or(LeagueError::EditionNotFound(edition))?;

        let mut tournaments = Vec::new();
        for tournament in tx.edition_tournaments(edition).await? {
            tournaments.push(TournamentGames {
                tournament_id: tournament.id,
                games: tx.tournament_games(tournament.id).await?,
            });
        }

        Ok(compute_standings(&teams, &tournaments))
    }

    /// Player table of a tournament: score, then full and median Buchholz.
    ///
    /// Covers the edition's in-play players; ties fall back to player id.
    ///
    /// # Errors
    ///
    /// * `LeagueError::TournamentNotFound` - Unknown tournament
    pub async fn tournament_table(
        &self,
        tournament: TournamentId,
    ) -> LeagueResult<Vec<PlayerStanding>> {
        let mut tx = self.store.begin().await?;

        let record = tx
            .find_tournament(tournament)
            .await?
            .ok_or(LeagueError::TournamentNotFound(tournament))?;
        let roster: Vec<PlayerId> = tx
            .edition_roster(record.edition_id)
            .await?
            .iter()
            .map(|entry| entry.player_id)
            .collect();
        let games = tx.tournament_games(tournament).await?;

        let players = players_from_matches(&roster, games.iter().map(|g| &g.pairing));

        let mut table: Vec<PlayerStanding> = players
            .iter()
            .map(|p| PlayerStanding {
                player_id: p.id,
                score: p.score,
                buchholz: full_buchholz(&players, p.id),
                median_buchholz: median_buchholz(&players, p.id),
                had_bye: p.had_bye,
            })
            .collect();

        table.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(b.buchholz.cmp(&a.buchholz))
                .then(b.median_buchholz.cmp(&a.median_buchholz))
                .then(a.player_id.cmp(&b.player_id))
        });
        Ok(table)
    }
}
