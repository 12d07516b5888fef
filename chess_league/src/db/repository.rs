//! Store traits for league persistence and the PostgreSQL implementation.
//!
//! Lifecycle operations run inside a [`LeagueTransaction`] obtained from
//! [`LeagueStore::begin`]. A transaction dropped without [`LeagueTransaction::commit`]
//! is rolled back, so a failed pairing leaves nothing behind.
//!
//! The PostgreSQL store expects these tables:
//!
//! ```text
//! editions      (id BIGINT PK, name TEXT)
//! teams         (id BIGINT PK, name TEXT)
//! edition_teams (edition_id BIGINT, team_id BIGINT)
//! team_members  (team_id BIGINT, player_id BIGINT, in_play BOOLEAN)
//! tournaments   (id BIGINT PK, edition_id BIGINT, name TEXT, tournament_type TEXT,
//!                status TEXT, current_round INT NULL,
//!                started_at TIMESTAMPTZ NULL, finished_at TIMESTAMPTZ NULL)
//! games         (id BIGSERIAL PK, tournament_id BIGINT, round INT,
//!                white_player_id BIGINT, black_player_id BIGINT NULL,
//!                white_team_id BIGINT NULL, black_team_id BIGINT NULL,
//!                outcome TEXT NULL)
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::sync::Arc;

use crate::errors::{LeagueError, LeagueResult};
use crate::league::{
    EditionId, Game, GameId, Match, Outcome, RosterEntry, TeamId, Tournament, TournamentId,
    TournamentStatus, TournamentType,
};

/// Source of league transactions
#[async_trait]
pub trait LeagueStore: Send + Sync {
    /// Open a transaction
    async fn begin(&self) -> LeagueResult<Box<dyn LeagueTransaction>>;
}

/// Unit of work against the league store
#[async_trait]
pub trait LeagueTransaction: Send {
    /// Take the store-wide activation lock until the transaction ends
    async fn lock_activation(&mut self) -> LeagueResult<()>;

    /// Load a tournament and lock it until the transaction ends
    async fn lock_tournament(&mut self, id: TournamentId) -> LeagueResult<Option<Tournament>>;

    /// Load a tournament without locking it
    async fn find_tournament(&mut self, id: TournamentId) -> LeagueResult<Option<Tournament>>;

    /// All tournaments currently in the ongoing state
    async fn ongoing_tournaments(&mut self) -> LeagueResult<Vec<Tournament>>;

    /// In-play players of the edition's teams, ordered by player id
    async fn edition_roster(&mut self, edition: EditionId) -> LeagueResult<Vec<RosterEntry>>;

    /// Teams joined to the edition, or `None` if the edition does not exist
    async fn edition_teams(&mut self, edition: EditionId) -> LeagueResult<Option<Vec<TeamId>>>;

    /// Tournaments of the edition, ordered by id
    async fn edition_tournaments(&mut self, edition: EditionId) -> LeagueResult<Vec<Tournament>>;

    /// Games of a tournament, ordered by round then id
    async fn tournament_games(&mut self, tournament: TournamentId) -> LeagueResult<Vec<Game>>;

    async fn find_game(&mut self, id: GameId) -> LeagueResult<Option<Game>>;

    /// Persist matches, returning them with their assigned ids
    async fn insert_games(
        &mut self,
        tournament: TournamentId,
        matches: &[Match],
    ) -> LeagueResult<Vec<Game>>;

    /// Write status, round and timestamps
    async fn update_tournament(&mut self, tournament: &Tournament) -> LeagueResult<()>;

    async fn set_game_outcome(&mut self, id: GameId, outcome: Option<Outcome>)
    -> LeagueResult<()>;

    async fn commit(self: Box<Self>) -> LeagueResult<()>;
}

/// Advisory lock key serializing tournament activation
const ACTIVATION_LOCK_KEY: i64 = 0x6c65_6167_7565;

const TOURNAMENT_COLUMNS: &str =
    "id, edition_id, name, tournament_type, status, current_round, started_at, finished_at";

const GAME_COLUMNS: &str = "id, tournament_id, round, white_player_id, black_player_id, \
                            white_team_id, black_team_id, outcome";

fn parse_kind(value: &str) -> LeagueResult<TournamentType> {
    match value {
        "swiss" => Ok(TournamentType::Swiss),
        "round_robin" => Ok(TournamentType::RoundRobin),
        other => Err(LeagueError::CorruptRecord(format!(
            "unknown tournament type '{other}'"
        ))),
    }
}

fn parse_status(value: &str) -> LeagueResult<TournamentStatus> {
    match value {
        "upcoming" => Ok(TournamentStatus::Upcoming),
        "ongoing" => Ok(TournamentStatus::Ongoing),
        "finished" => Ok(TournamentStatus::Finished),
        other => Err(LeagueError::CorruptRecord(format!(
            "unknown tournament status '{other}'"
        ))),
    }
}

fn parse_round(value: i32) -> LeagueResult<u32> {
    u32::try_from(value)
        .map_err(|_| LeagueError::CorruptRecord(format!("negative round number {value}")))
}

fn round_column(round: u32) -> LeagueResult<i32> {
    i32::try_from(round)
        .map_err(|_| LeagueError::CorruptRecord(format!("round {round} out of range")))
}

fn tournament_from_row(row: &PgRow) -> LeagueResult<Tournament> {
    let kind: String = row.try_get("tournament_type")?;
    let status: String = row.try_get("status")?;
    let current_round: Option<i32> = row.try_get("current_round")?;

    Ok(Tournament {
        id: row.try_get("id")?,
        edition_id: row.try_get("edition_id")?,
        name: row.try_get("name")?,
        kind: parse_kind(&kind)?,
        status: parse_status(&status)?,
        current_round: current_round.map(parse_round).transpose()?,
        started_at: row.try_get::<Option<DateTime<Utc>>, _>("started_at")?,
        finished_at: row.try_get::<Option<DateTime<Utc>>, _>("finished_at")?,
    })
}

fn game_from_row(row: &PgRow) -> LeagueResult<Game> {
    let outcome: Option<String> = row.try_get("outcome")?;
    let outcome = outcome
        .map(|value| value.parse::<Outcome>().map_err(LeagueError::CorruptRecord))
        .transpose()?;

    Ok(Game {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        pairing: Match {
            white: row.try_get("white_player_id")?,
            black: row.try_get("black_player_id")?,
            white_team: row.try_get("white_team_id")?,
            black_team: row.try_get("black_team_id")?,
            round: parse_round(row.try_get("round")?)?,
            outcome,
        },
    })
}

/// PostgreSQL implementation of [`LeagueStore`]
#[derive(Clone)]
pub struct PgLeagueStore {
    pool: Arc<PgPool>,
}

impl PgLeagueStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeagueStore for PgLeagueStore {
    async fn begin(&self) -> LeagueResult<Box<dyn LeagueTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgLeagueTransaction { tx }))
    }
}

/// Open PostgreSQL transaction
pub struct PgLeagueTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgLeagueTransaction {
    async fn fetch_tournament(
        &mut self,
        id: TournamentId,
        for_update: bool,
    ) -> LeagueResult<Option<Tournament>> {
        let sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1{}",
            if for_update { " FOR UPDATE" } else { "" }
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }
}

#[async_trait]
impl LeagueTransaction for PgLeagueTransaction {
    async fn lock_activation(&mut self) -> LeagueResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(ACTIVATION_LOCK_KEY)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn lock_tournament(&mut self, id: TournamentId) -> LeagueResult<Option<Tournament>> {
        self.fetch_tournament(id, true).await
    }

    async fn find_tournament(&mut self, id: TournamentId) -> LeagueResult<Option<Tournament>> {
        self.fetch_tournament(id, false).await
    }

    async fn ongoing_tournaments(&mut self) -> LeagueResult<Vec<Tournament>> {
        let sql = format!("SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE status = $1 ORDER BY id");
        let rows = sqlx::query(&sql)
            .bind(TournamentStatus::Ongoing.as_str())
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn edition_roster(&mut self, edition: EditionId) -> LeagueResult<Vec<RosterEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT tm.player_id, tm.team_id
            FROM team_members tm
            JOIN edition_teams et ON et.team_id = tm.team_id
            WHERE et.edition_id = $1 AND tm.in_play
            ORDER BY tm.player_id
            "#,
        )
        .bind(edition)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.iter()
            .map(|r| {
                Ok(RosterEntry {
                    player_id: r.try_get("player_id")?,
                    team_id: r.try_get("team_id")?,
                })
            })
            .collect()
    }

    async fn edition_teams(&mut self, edition: EditionId) -> LeagueResult<Option<Vec<TeamId>>> {
        let exists = sqlx::query("SELECT id FROM editions WHERE id = $1")
            .bind(edition)
            .fetch_optional(&mut *self.tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let rows = sqlx::query(
            "SELECT team_id FROM edition_teams WHERE edition_id = $1 ORDER BY team_id",
        )
        .bind(edition)
        .fetch_all(&mut *self.tx)
        .await?;

        let teams = rows
            .iter()
            .map(|r| r.try_get("team_id"))
            .collect::<Result<Vec<TeamId>, _>>()?;
        Ok(Some(teams))
    }

    async fn edition_tournaments(&mut self, edition: EditionId) -> LeagueResult<Vec<Tournament>> {
        let sql = format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE edition_id = $1 ORDER BY id"
        );
        let rows = sqlx::query(&sql)
            .bind(edition)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(tournament_from_row).collect()
    }

    async fn tournament_games(&mut self, tournament: TournamentId) -> LeagueResult<Vec<Game>> {
        let sql = format!(
            "SELECT {GAME_COLUMNS} FROM games WHERE tournament_id = $1 ORDER BY round, id"
        );
        let rows = sqlx::query(&sql)
            .bind(tournament)
            .fetch_all(&mut *self.tx)
            .await?;

        rows.iter().map(game_from_row).collect()
    }

    async fn find_game(&mut self, id: GameId) -> LeagueResult<Option<Game>> {
        let sql = format!("SELECT {GAME_COLUMNS} FROM games WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;

        row.as_ref().map(game_from_row).transpose()
    }

    async fn insert_games(
        &mut self,
        tournament: TournamentId,
        matches: &[Match],
    ) -> LeagueResult<Vec<Game>> {
        let mut games = Vec::with_capacity(matches.len());

        for pairing in matches {
            let row = sqlx::query(
                r#"
                INSERT INTO games (tournament_id, round, white_player_id, black_player_id,
                                   white_team_id, black_team_id, outcome)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id
                "#,
            )
            .bind(tournament)
            .bind(round_column(pairing.round)?)
            .bind(pairing.white)
            .bind(pairing.black)
            .bind(pairing.white_team)
            .bind(pairing.black_team)
            .bind(pairing.outcome.map(Outcome::as_str))
            .fetch_one(&mut *self.tx)
            .await?;

            games.push(Game {
                id: row.try_get("id")?,
                tournament_id: tournament,
                pairing: pairing.clone(),
            });
        }

        Ok(games)
    }

    async fn update_tournament(&mut self, tournament: &Tournament) -> LeagueResult<()> {
        let current_round = tournament.current_round.map(round_column).transpose()?;

        sqlx::query(
            r#"
            UPDATE tournaments
            SET status = $1, current_round = $2, started_at = $3, finished_at = $4
            WHERE id = $5
            "#,
        )
        .bind(tournament.status.as_str())
        .bind(current_round)
        .bind(tournament.started_at)
        .bind(tournament.finished_at)
        .bind(tournament.id)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn set_game_outcome(
        &mut self,
        id: GameId,
        outcome: Option<Outcome>,
    ) -> LeagueResult<()> {
        let result = sqlx::query("UPDATE games SET outcome = $1 WHERE id = $2")
            .bind(outcome.map(Outcome::as_str))
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(LeagueError::GameNotFound(id));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> LeagueResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
