//! Tournament lifecycle: activation, round advancement and completion.
//!
//! Each operation runs in one store transaction. Activation holds the
//! store-wide activation lock while it checks that no other tournament is
//! ongoing; advancing and recording outcomes lock the tournament record, so
//! a result cannot land between the completeness check and the new round.

use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

use crate::db::{LeagueStore, LeagueTransaction};
use crate::errors::{LeagueError, LeagueResult};
use crate::league::{
    Game, GameId, Match, Outcome, Player, RosterEntry, Tournament, TournamentId, TournamentStatus,
    TournamentType, players_from_matches,
};
use crate::pairing::{PairingMethod, PairingResult, PairingStrategy};

/// Tournament state together with the games of its current round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundReport {
    pub tournament: Tournament,
    pub games: Vec<Game>,
}

/// Drives tournaments through upcoming, ongoing and finished
#[derive(Clone)]
pub struct TournamentLifecycle {
    store: Arc<dyn LeagueStore>,
    rng: Arc<Mutex<StdRng>>,
}

async fn locked_tournament(
    tx: &mut dyn LeagueTransaction,
    id: TournamentId,
) -> LeagueResult<Tournament> {
    tx.lock_tournament(id)
        .await?
        .ok_or(LeagueError::TournamentNotFound(id))
}

fn require_status(tournament: &Tournament, expected: TournamentStatus) -> LeagueResult<()> {
    if tournament.status != expected {
        return Err(LeagueError::InvalidState {
            expected,
            actual: tournament.status,
        });
    }
    Ok(())
}

fn current_round(tournament: &Tournament) -> LeagueResult<u32> {
    tournament.current_round.ok_or_else(|| {
        LeagueError::CorruptRecord(format!(
            "ongoing tournament {} has no current round",
            tournament.id
        ))
    })
}

impl TournamentLifecycle {
    /// Create a lifecycle with an OS-seeded random source
    pub fn new(store: Arc<dyn LeagueStore>) -> Self {
        Self::with_rng(store, StdRng::from_os_rng())
    }

    /// Create a lifecycle whose color tie-breaks replay for a given seed
    pub fn with_seed(store: Arc<dyn LeagueStore>, seed: u64) -> Self {
        Self::with_rng(store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(store: Arc<dyn LeagueStore>, rng: StdRng) -> Self {
        Self {
            store,
            rng: Arc::new(Mutex::new(rng)),
        }
    }

    fn pair(
        &self,
        kind: TournamentType,
        players: &[Player],
        rounds_so_far: u32,
    ) -> PairingResult<Vec<Match>> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        PairingMethod::from(kind).next_round(players, rounds_so_far, &mut *rng)
    }

    fn pair_with_teams(
        &self,
        kind: TournamentType,
        roster: &[RosterEntry],
        players: &[Player],
        rounds_so_far: u32,
    ) -> LeagueResult<Vec<Match>> {
        let matches = self.pair(kind, players, rounds_so_far)?;
        Ok(matches.into_iter().map(|m| m.with_teams(roster)).collect())
    }

    /// Start an upcoming tournament and pair its first round.
    ///
    /// Every in-play player of the edition's teams takes part.
    ///
    /// # Errors
    ///
    /// * `LeagueError::TournamentNotFound` - Unknown tournament
    /// * `LeagueError::InvalidState` - Tournament is not upcoming
    /// * `LeagueError::AnotherTournamentOngoing` - Some other tournament is ongoing
    /// * `LeagueError::Pairing` - The first round could not be paired
    pub async fn activate(&self, id: TournamentId) -> LeagueResult<RoundReport> {
        let mut tx = self.store.begin().await?;
        tx.lock_activation().await?;

        let mut tournament = locked_tournament(tx.as_mut(), id).await?;
        require_status(&tournament, TournamentStatus::Upcoming)?;

        if let Some(other) = tx
            .ongoing_tournaments()
            .await?
            .into_iter()
            .find(|t| t.id != id)
        {
            log::warn!(
                "Refused to activate tournament {}: tournament {} is ongoing",
                id,
                other.id
            );
            return Err(LeagueError::AnotherTournamentOngoing {
                requested: id,
                ongoing: other.id,
            });
        }

        let roster = tx.edition_roster(tournament.edition_id).await?;
        let players: Vec<Player> = roster.iter().map(|e| Player::new(e.player_id)).collect();
        let matches = self.pair_with_teams(tournament.kind, &roster, &players, 0)?;

        tournament.status = TournamentStatus::Ongoing;
        tournament.current_round = Some(1);
        tournament.started_at = Some(Utc::now());

        tx.update_tournament(&tournament).await?;
        let games = tx.insert_games(id, &matches).await?;
        tx.commit().await?;

        log::info!(
            "Activated tournament {} with {} players, {} games in round 1",
            id,
            players.len(),
            games.len()
        );

        Ok(RoundReport { tournament, games })
    }

    /// Pair the next round once every game of the current round is decided.
    ///
    /// # Errors
    ///
    /// * `LeagueError::TournamentNotFound` - Unknown tournament
    /// * `LeagueError::InvalidState` - Tournament is not ongoing
    /// * `LeagueError::IncompleteRound` - A non-bye game of the current round has no outcome
    /// * `LeagueError::Pairing` - The next round could not be paired
    pub async fn advance_round(&self, id: TournamentId) -> LeagueResult<RoundReport> {
        let mut tx = self.store.begin().await?;

        let mut tournament = locked_tournament(tx.as_mut(), id).await?;
        require_status(&tournament, TournamentStatus::Ongoing)?;
        let round = current_round(&tournament)?;

        let history = tx.tournament_games(id).await?;
        let pending = history
            .iter()
            .filter(|g| g.round() == round && !g.pairing.is_bye() && !g.is_decided())
            .count();
        if pending > 0 {
            return Err(LeagueError::IncompleteRound { round, pending });
        }

        let roster = tx.edition_roster(tournament.edition_id).await?;
        let ids: Vec<_> = roster.iter().map(|e| e.player_id).collect();
        let players = players_from_matches(&ids, history.iter().map(|g| &g.pairing));
        let matches = self.pair_with_teams(tournament.kind, &roster, &players, round)?;

        tournament.current_round = Some(round + 1);

        tx.update_tournament(&tournament).await?;
        let games = tx.insert_games(id, &matches).await?;
        tx.commit().await?;

        log::info!(
            "Tournament {} advanced to round {} with {} games",
            id,
            round + 1,
            games.len()
        );

        Ok(RoundReport { tournament, games })
    }

    /// Finish an ongoing tournament, freezing its round number.
    ///
    /// # Errors
    ///
    /// * `LeagueError::TournamentNotFound` - Unknown tournament
    /// * `LeagueError::InvalidState` - Tournament is not ongoing
    pub async fn deactivate(&self, id: TournamentId) -> LeagueResult<Tournament> {
        let mut tx = self.store.begin().await?;

        let mut tournament = locked_tournament(tx.as_mut(), id).await?;
        require_status(&tournament, TournamentStatus::Ongoing)?;

        tournament.status = TournamentStatus::Finished;
        tournament.finished_at = Some(Utc::now());

        tx.update_tournament(&tournament).await?;
        tx.commit().await?;

        log::info!(
            "Finished tournament {} after round {}",
            id,
            tournament.current_round.unwrap_or_default()
        );

        Ok(tournament)
    }

    /// Set or correct the outcome of a game.
    ///
    /// # Errors
    ///
    /// * `LeagueError::GameNotFound` - Unknown game
    /// * `LeagueError::InvalidState` - The game's tournament is not ongoing
    /// * `LeagueError::ByeHasNoOutcome` - The game is a bye
    pub async fn record_outcome(&self, game_id: GameId, outcome: Outcome) -> LeagueResult<Game> {
        let mut tx = self.store.begin().await?;

        let mut game = tx
            .find_game(game_id)
            .await?
            .ok_or(LeagueError::GameNotFound(game_id))?;
        let tournament = locked_tournament(tx.as_mut(), game.tournament_id).await?;
        require_status(&tournament, TournamentStatus::Ongoing)?;

        if game.pairing.is_bye() {
            return Err(LeagueError::ByeHasNoOutcome(game_id));
        }

        tx.set_game_outcome(game_id, Some(outcome)).await?;
        tx.commit().await?;

        if game.pairing.outcome.is_some_and(|previous| previous != outcome) {
            log::info!("Corrected game {} to {}", game_id, outcome);
        }
        game.pairing.outcome = Some(outcome);

        Ok(game)
    }

    /// The tournament and the games of its current round
    ///
    /// # Errors
    ///
    /// * `LeagueError::TournamentNotFound` - Unknown tournament
    pub async fn round_games(&self, id: TournamentId) -> LeagueResult<RoundReport> {
        let mut tx = self.store.begin().await?;

        let tournament = tx
            .find_tournament(id)
            .await?
            .ok_or(LeagueError::TournamentNotFound(id))?;

        let games = match tournament.current_round {
            Some(round) => tx
                .tournament_games(id)
                .await?
                .into_iter()
                .filter(|g| g.round() == round)
                .collect(),
            None => Vec::new(),
        };

        Ok(RoundReport { tournament, games })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryLeagueStore;
    use crate::league::{Edition, Team};

    async fn league(player_count: i64) -> InMemoryLeagueStore {
        let store = InMemoryLeagueStore::new();
        store.insert_edition(Edition::new(1, "Winter".to_string())).await;

        let mut team = Team::new(10, "Queens".to_string());
        for id in 1..=player_count {
            team = team.with_player(id);
        }
        store.insert_team(team).await;
        store.join_edition(10, 1).await.unwrap();
        store
            .insert_tournament(Tournament::new(
                1,
                1,
                "Main".to_string(),
                TournamentType::Swiss,
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_activate_pairs_round_one() {
        let store = league(5).await;
        let lifecycle = TournamentLifecycle::with_seed(Arc::new(store.clone()), 3);

        let report = lifecycle.activate(1).await.unwrap();
        assert_eq!(report.tournament.status, TournamentStatus::Ongoing);
        assert_eq!(report.tournament.current_round, Some(1));
        assert!(report.tournament.started_at.is_some());
        assert_eq!(report.games.len(), 3);
        assert_eq!(report.games.iter().filter(|g| g.pairing.is_bye()).count(), 1);
        assert!(report.games.iter().all(|g| g.pairing.white_team == Some(10)));

        assert_eq!(store.games(1).await, report.games);
    }

    #[tokio::test]
    async fn test_activate_twice_is_invalid() {
        let store = league(4).await;
        let lifecycle = TournamentLifecycle::with_seed(Arc::new(store), 3);

        lifecycle.activate(1).await.unwrap();
        let err = lifecycle.activate(1).await.unwrap_err();
        assert!(matches!(
            err,
            LeagueError::InvalidState {
                expected: TournamentStatus::Upcoming,
                actual: TournamentStatus::Ongoing,
            }
        ));
    }

    #[tokio::test]
    async fn test_record_outcome_rejects_bye() {
        let store = league(3).await;
        let lifecycle = TournamentLifecycle::with_seed(Arc::new(store), 9);

        let report = lifecycle.activate(1).await.unwrap();
        let bye = report.games.iter().find(|g| g.pairing.is_bye()).unwrap();
        let err = lifecycle.record_outcome(bye.id, Outcome::Draw).await.unwrap_err();
        assert!(matches!(err, LeagueError::ByeHasNoOutcome(id) if id == bye.id));
    }

    #[tokio::test]
    async fn test_failed_pairing_persists_nothing() {
        // Two players who already met cannot be paired again
        let store = league(2).await;
        let lifecycle = TournamentLifecycle::with_seed(Arc::new(store.clone()), 1);

        let report = lifecycle.activate(1).await.unwrap();
        let game = &report.games[0];
        lifecycle.record_outcome(game.id, Outcome::WhiteWin).await.unwrap();

        let err = lifecycle.advance_round(1).await.unwrap_err();
        assert!(matches!(err, LeagueError::Pairing(_)));

        let tournament = store.tournament(1).await.unwrap();
        assert_eq!(tournament.current_round, Some(1));
        assert_eq!(store.games(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_round_games_before_activation() {
        let store = league(4).await;
        let lifecycle = TournamentLifecycle::with_seed(Arc::new(store), 1);

        let report = lifecycle.round_games(1).await.unwrap();
        assert_eq!(report.tournament.status, TournamentStatus::Upcoming);
        assert!(report.games.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_tournament() {
        let store = league(4).await;
        let lifecycle = TournamentLifecycle::with_seed(Arc::new(store), 1);

        assert!(matches!(
            lifecycle.advance_round(42).await.unwrap_err(),
            LeagueError::TournamentNotFound(42)
        ));
        assert!(matches!(
            lifecycle.record_outcome(42, Outcome::Draw).await.unwrap_err(),
            LeagueError::GameNotFound(42)
        ));
    }
}
