//! In-memory league store.
//!
//! Each transaction holds the store mutex for its whole lifetime and works
//! on a copy of the state; commit writes the copy back. Transactions are
//! therefore fully serialized, which covers both the activation lock and
//! per-tournament locks.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::repository::{LeagueStore, LeagueTransaction};
use crate::errors::{LeagueError, LeagueResult};
use crate::league::{
    Edition, EditionId, Game, GameId, Match, Outcome, RosterEntry, Team, TeamId, Tournament,
    TournamentId, TournamentStatus,
};

#[derive(Debug, Clone, Default)]
struct LeagueState {
    editions: BTreeMap<EditionId, Edition>,
    teams: BTreeMap<TeamId, Team>,
    tournaments: BTreeMap<TournamentId, Tournament>,
    games: BTreeMap<GameId, Game>,
    next_game_id: GameId,
}

impl LeagueState {
    fn roster(&self, edition: EditionId) -> Vec<RosterEntry> {
        let Some(edition) = self.editions.get(&edition) else {
            return Vec::new();
        };

        let mut roster: Vec<RosterEntry> = edition
            .teams
            .iter()
            .filter_map(|id| self.teams.get(id))
            .flat_map(|team| {
                team.members
                    .iter()
                    .filter(|m| m.in_play)
                    .map(move |m| RosterEntry {
                        player_id: m.player_id,
                        team_id: team.id,
                    })
            })
            .collect();
        roster.sort_by_key(|entry| entry.player_id);
        roster
    }

    fn games_of(&self, tournament: TournamentId) -> Vec<Game> {
        let mut games: Vec<Game> = self
            .games
            .values()
            .filter(|g| g.tournament_id == tournament)
            .cloned()
            .collect();
        games.sort_by_key(|g| (g.round(), g.id));
        games
    }
}

/// League store kept in process memory
#[derive(Clone, Default)]
pub struct InMemoryLeagueStore {
    state: Arc<Mutex<LeagueState>>,
}

impl InMemoryLeagueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_edition(&self, edition: Edition) {
        let mut state = self.state.lock().await;
        state.editions.insert(edition.id, edition);
    }

    pub async fn insert_team(&self, team: Team) {
        let mut state = self.state.lock().await;
        state.teams.insert(team.id, team);
    }

    /// Join a team to an edition.
    ///
    /// # Errors
    ///
    /// * `LeagueError::EditionNotFound` - Unknown edition
    pub async fn join_edition(&self, team: TeamId, edition: EditionId) -> LeagueResult<()> {
        let mut state = self.state.lock().await;
        let entry = state
            .editions
            .get_mut(&edition)
            .ok_or(LeagueError::EditionNotFound(edition))?;
        if !entry.teams.contains(&team) {
            entry.teams.push(team);
        }
        if let Some(team) = state.teams.get_mut(&team)
            && !team.editions.contains(&edition)
        {
            team.editions.push(edition);
        }
        Ok(())
    }

    /// Add a tournament to its edition.
    ///
    /// # Errors
    ///
    /// * `LeagueError::EditionNotFound` - The tournament's edition is unknown
    pub async fn insert_tournament(&self, tournament: Tournament) -> LeagueResult<()> {
        let mut state = self.state.lock().await;
        let edition = state
            .editions
            .get_mut(&tournament.edition_id)
            .ok_or(LeagueError::EditionNotFound(tournament.edition_id))?;
        if !edition.tournaments.contains(&tournament.id) {
            edition.tournaments.push(tournament.id);
        }
        state.tournaments.insert(tournament.id, tournament);
        Ok(())
    }

    /// Store a game as-is, for seeding history
    pub async fn insert_game(&self, game: Game) {
        let mut state = self.state.lock().await;
        state.next_game_id = state.next_game_id.max(game.id);
        state.games.insert(game.id, game);
    }

    pub async fn tournament(&self, id: TournamentId) -> Option<Tournament> {
        self.state.lock().await.tournaments.get(&id).cloned()
    }

    pub async fn games(&self, tournament: TournamentId) -> Vec<Game> {
        self.state.lock().await.games_of(tournament)
    }
}

#[async_trait]
impl LeagueStore for InMemoryLeagueStore {
    async fn begin(&self) -> LeagueResult<Box<dyn LeagueTransaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = (*guard).clone();
        Ok(Box::new(InMemoryTransaction { guard, working }))
    }
}

/// Transaction over [`InMemoryLeagueStore`]; discarded unless committed
pub struct InMemoryTransaction {
    guard: OwnedMutexGuard<LeagueState>,
    working: LeagueState,
}

#[async_trait]
impl LeagueTransaction for InMemoryTransaction {
    async fn lock_activation(&mut self) -> LeagueResult<()> {
        Ok(())
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> LeagueResult<Option<Tournament>> {
        Ok(self.working.tournaments.get(&id).cloned())
    }

    async fn find_tournament(&mut self, id: TournamentId) -> LeagueResult<Option<Tournament>> {
        Ok(self.working.tournaments.get(&id).cloned())
    }

    async fn ongoing_tournaments(&mut self) -> LeagueResult<Vec<Tournament>> {
        Ok(self
            .working
            .tournaments
            .values()
            .filter(|t| t.status == TournamentStatus::Ongoing)
            .cloned()
            .collect())
    }

    async fn edition_roster(&mut self, edition: EditionId) -> LeagueResult<Vec<RosterEntry>> {
        Ok(self.working.roster(edition))
    }

    async fn edition_teams(&mut self, edition: EditionId) -> LeagueResult<Option<Vec<TeamId>>> {
        Ok(self.working.editions.get(&edition).map(|e| {
            let mut teams = e.teams.clone();
            teams.sort_unstable();
            teams
        }))
    }

    async fn edition_tournaments(&mut self, edition: EditionId) -> LeagueResult<Vec<Tournament>> {
        Ok(self
            .working
            .tournaments
            .values()
            .filter(|t| t.edition_id == edition)
            .cloned()
            .collect())
    }

    async fn tournament_games(&mut self, tournament: TournamentId) -> LeagueResult<Vec<Game>> {
        Ok(self.working.games_of(tournament))
    }

    async fn find_game(&mut self, id: GameId) -> LeagueResult<Option<Game>> {
        Ok(self.working.games.get(&id).cloned())
    }

    async fn insert_games(
        &mut self,
        tournament: TournamentId,
        matches: &[Match],
    ) -> LeagueResult<Vec<Game>> {
        let mut games = Vec::with_capacity(matches.len());
        for pairing in matches {
            self.working.next_game_id += 1;
            let game = Game {
                id: self.working.next_game_id,
                tournament_id: tournament,
                pairing: pairing.clone(),
            };
            self.working.games.insert(game.id, game.clone());
            games.push(game);
        }
        Ok(games)
    }

    async fn update_tournament(&mut self, tournament: &Tournament) -> LeagueResult<()> {
        let stored = self
            .working
            .tournaments
            .get_mut(&tournament.id)
            .ok_or(LeagueError::TournamentNotFound(tournament.id))?;
        stored.status = tournament.status;
        stored.current_round = tournament.current_round;
        stored.started_at = tournament.started_at;
        stored.finished_at = tournament.finished_at;
        Ok(())
    }

    async fn set_game_outcome(
        &mut self,
        id: GameId,
        outcome: Option<Outcome>,
    ) -> LeagueResult<()> {
        let game = self
            .working
            .games
            .get_mut(&id)
            .ok_or(LeagueError::GameNotFound(id))?;
        game.pairing.outcome = outcome;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LeagueResult<()> {
        let InMemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
