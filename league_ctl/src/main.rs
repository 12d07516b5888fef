//! Operator command line for chess league tournaments.
//!
//! Runs lifecycle and standings operations against the PostgreSQL store and
//! prints the result as a table or as JSON.

mod config;
mod logging;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Error, anyhow, bail};
use chess_league::{
    RoundReport, StandingsManager, TeamStanding, TournamentLifecycle,
    db::{Database, LeagueStore, PgLeagueStore},
    league::{Game, Outcome, Tournament},
    standings::PlayerStanding,
};
use log::info;
use pico_args::Arguments;
use serde::Serialize;

use config::CtlConfig;

const HELP: &str = "\
Manage chess league tournaments

USAGE:
  league_ctl [OPTIONS] <COMMAND> <ARGS>

COMMANDS:
  activate   <TOURNAMENT>       Start a tournament and pair round 1
  advance    <TOURNAMENT>       Pair the next round once the current one is decided
  deactivate <TOURNAMENT>       Finish an ongoing tournament
  round      <TOURNAMENT>       Show the games of the current round
  table      <TOURNAMENT>       Show player scores with Buchholz tie-breaks
  record     <GAME> <OUTCOME>   Record a result: white, draw or black
  standings  <EDITION>          Show team small and big points

OPTIONS:
  --db-url     URL         Database connection string  [default: env DATABASE_URL]
  --seed       N           Seed for color tie-breaks   [default: env PAIRING_SEED or random]

FLAGS:
  --json                   Print results as JSON
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  PAIRING_SEED             Seed for color tie-breaks
  LEAGUE_JSON_OUTPUT       Print results as JSON when true
  RUST_LOG                 Log filter (default: info,sqlx=warn)
";

enum Command {
    Activate(i64),
    Advance(i64),
    Deactivate(i64),
    Round(i64),
    Table(i64),
    Record(i64, Outcome),
    Standings(i64),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Activate(_) => "activate",
            Command::Advance(_) => "advance",
            Command::Deactivate(_) => "deactivate",
            Command::Round(_) => "round",
            Command::Table(_) => "table",
            Command::Record(..) => "record",
            Command::Standings(_) => "standings",
        }
    }

    fn target(&self) -> i64 {
        match self {
            Command::Activate(id)
            | Command::Advance(id)
            | Command::Deactivate(id)
            | Command::Round(id)
            | Command::Table(id)
            | Command::Record(id, _)
            | Command::Standings(id) => *id,
        }
    }

    fn parse(pargs: &mut Arguments) -> Result<Self, Error> {
        let name: String = pargs.free_from_str().context("missing command, see --help")?;
        let id: i64 = pargs
            .free_from_str()
            .with_context(|| format!("'{name}' needs a numeric id"))?;

        let command = match name.as_str() {
            "activate" => Command::Activate(id),
            "advance" => Command::Advance(id),
            "deactivate" => Command::Deactivate(id),
            "round" => Command::Round(id),
            "table" => Command::Table(id),
            "standings" => Command::Standings(id),
            "record" => {
                let outcome: String = pargs
                    .free_from_str()
                    .context("'record' needs an outcome: white, draw or black")?;
                Command::Record(id, outcome.parse().map_err(|e: String| anyhow!(e))?)
            }
            other => bail!("unknown command '{other}', see --help"),
        };
        Ok(command)
    }
}

/// Refuse to run against a database without the league tables
fn ensure_schema(missing: &[&str]) -> Result<(), Error> {
    if missing.is_empty() {
        Ok(())
    } else {
        bail!("database is missing league tables: {}", missing.join(", "))
    }
}

/// Print `value` as JSON, or through `render` as text
fn emit<T: Serialize>(value: &T, json: bool, render: impl FnOnce(&T)) -> Result<(), Error> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        render(value);
    }
    Ok(())
}

fn print_tournament(tournament: &Tournament) {
    println!(
        "Tournament {} '{}' ({}): {}, round {}",
        tournament.id,
        tournament.name,
        tournament.kind.as_str(),
        tournament.status,
        tournament
            .current_round
            .map_or_else(|| "-".to_string(), |r| r.to_string())
    );
}

fn print_game(game: &Game) {
    let pairing = &game.pairing;
    match pairing.black {
        Some(black) => println!(
            "  #{:<6} {:>6} - {:<6} {}",
            game.id,
            pairing.white,
            black,
            pairing.outcome.map_or("pending", Outcome::as_str)
        ),
        None => println!("  #{:<6} {:>6}   bye", game.id, pairing.white),
    }
}

fn print_report(report: &RoundReport) {
    print_tournament(&report.tournament);
    for game in &report.games {
        print_game(game);
    }
}

fn print_standings(standings: &[TeamStanding]) {
    println!("{:<6} {:>8} {:>6} {:>6}", "Rank", "Team", "Small", "Big");
    for (i, row) in standings.iter().enumerate() {
        println!(
            "{:<6} {:>8} {:>6} {:>6}",
            i + 1,
            row.team_id,
            row.small_points,
            row.big_points
        );
    }
}

fn print_table(table: &[PlayerStanding]) {
    println!(
        "{:<6} {:>8} {:>6} {:>9} {:>7}",
        "Rank", "Player", "Score", "Buchholz", "Median"
    );
    for (i, row) in table.iter().enumerate() {
        println!(
            "{:<6} {:>8} {:>6} {:>9} {:>7}",
            i + 1,
            row.player_id,
            row.score,
            row.buchholz,
            row.median_buchholz
        );
    }
}

async fn run(command: &Command, store: Arc<dyn LeagueStore>, config: &CtlConfig) -> Result<(), Error> {
    let lifecycle = match config.pairing_seed {
        Some(seed) => TournamentLifecycle::with_seed(store.clone(), seed),
        None => TournamentLifecycle::new(store.clone()),
    };
    let standings = StandingsManager::new(store);
    let json = config.json_output;

    match *command {
        Command::Activate(id) => emit(&lifecycle.activate(id).await?, json, print_report),
        Command::Advance(id) => emit(&lifecycle.advance_round(id).await?, json, print_report),
        Command::Round(id) => emit(&lifecycle.round_games(id).await?, json, print_report),
        Command::Deactivate(id) => {
            emit(&lifecycle.deactivate(id).await?, json, print_tournament)
        }
        Command::Record(game, outcome) => emit(
            &lifecycle.record_outcome(game, outcome).await?,
            json,
            print_game,
        ),
        Command::Table(id) => emit(&standings.tournament_table(id).await?, json, |rows| {
            print_table(rows)
        }),
        Command::Standings(edition) => emit(
            &standings.compute_standings(edition).await?,
            json,
            |rows| print_standings(rows),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;
    let seed: Option<u64> = pargs.opt_value_from_str("--seed")?;
    let json = pargs.contains("--json");
    let command = Command::parse(&mut pargs)?;

    let remaining = pargs.finish();
    if !remaining.is_empty() {
        bail!("unexpected arguments: {remaining:?}");
    }

    logging::init();

    let config = CtlConfig::from_env(database_url, seed, json)?;
    config.validate()?;

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))?;
    let missing = db.missing_tables().await?;
    if let Err(e) = ensure_schema(&missing) {
        db.close().await;
        return Err(e);
    }
    info!("Database connected");

    let store: Arc<dyn LeagueStore> = Arc::new(PgLeagueStore::new(Arc::new(db.pool().clone())));

    let started = Instant::now();
    let result = run(&command, store, &config).await;
    db.close().await;

    let result = result.map_err(|e| match e.downcast::<chess_league::LeagueError>() {
        Ok(league) => anyhow!("{} failed: {}", command.name(), league.client_message()),
        Err(other) => other,
    });
    result?;

    logging::log_operation(
        command.name(),
        started.elapsed().as_millis() as u64,
        command.target(),
    );
    Ok(())
}
