//! League data models: players, matches, tournaments, teams and editions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeSet,
    fmt,
    ops::{Add, AddAssign},
};

/// Player ID type
pub type PlayerId = i64;

/// Team ID type
pub type TeamId = i64;

/// Edition ID type
pub type EditionId = i64;

/// Tournament ID type
pub type TournamentId = i64;

/// Game ID type
pub type GameId = i64;

/// Fixed-point score counted in half-points.
///
/// A win is worth two half-points and a draw one, so scores compare and
/// group exactly without floating point.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Score(u32);

impl Score {
    pub const ZERO: Score = Score(0);
    pub const DRAW: Score = Score(1);
    pub const WIN: Score = Score(2);

    pub const fn from_half_points(half_points: u32) -> Self {
        Self(half_points)
    }

    pub const fn half_points(self) -> u32 {
        self.0
    }

    /// Score in conventional points (1.0 per win, 0.5 per draw)
    pub fn as_points(self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl Add for Score {
    type Output = Score;

    fn add(self, rhs: Score) -> Score {
        Score(self.0 + rhs.0)
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, rhs: Score) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Score {
    fn sum<I: Iterator<Item = Score>>(iter: I) -> Score {
        iter.fold(Score::ZERO, Add::add)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 % 2 == 0 {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

/// Piece color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Result of a played game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    WhiteWin,
    Draw,
    BlackWin,
}

impl Outcome {
    /// Points earned by the side playing `color`
    pub fn score_for(self, color: Color) -> Score {
        match (self, color) {
            (Outcome::Draw, _) => Score::DRAW,
            (Outcome::WhiteWin, Color::White) | (Outcome::BlackWin, Color::Black) => Score::WIN,
            _ => Score::ZERO,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::WhiteWin => "white_win",
            Outcome::Draw => "draw",
            Outcome::BlackWin => "black_win",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Outcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "white_win" | "white" | "1-0" => Ok(Outcome::WhiteWin),
            "draw" | "1/2-1/2" => Ok(Outcome::Draw),
            "black_win" | "black" | "0-1" => Ok(Outcome::BlackWin),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// Per-tournament projection of a player, rebuilt from game history every round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub score: Score,
    /// Opponents already faced in this tournament
    pub opponents: BTreeSet<PlayerId>,
    /// Colors in the order they were played
    pub colors: Vec<Color>,
    pub had_bye: bool,
}

impl Player {
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            score: Score::ZERO,
            opponents: BTreeSet::new(),
            colors: Vec::new(),
            had_bye: false,
        }
    }

    pub fn has_faced(&self, other: PlayerId) -> bool {
        self.opponents.contains(&other)
    }

    pub fn white_count(&self) -> usize {
        self.colors.iter().filter(|c| **c == Color::White).count()
    }

    pub fn black_count(&self) -> usize {
        self.colors.len() - self.white_count()
    }

    /// Whites minus blacks
    pub fn color_balance(&self) -> i64 {
        self.white_count() as i64 - self.black_count() as i64
    }

    /// Whether playing `color` next would make three in a row
    pub fn would_repeat_thrice(&self, color: Color) -> bool {
        self.colors.len() >= 2 && self.colors[self.colors.len() - 2..].iter().all(|c| *c == color)
    }
}

/// A pairing of two players (or a bye) for one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub white: PlayerId,
    /// `None` marks a bye
    pub black: Option<PlayerId>,
    pub white_team: Option<TeamId>,
    pub black_team: Option<TeamId>,
    pub round: u32,
    /// `None` until the game is played
    pub outcome: Option<Outcome>,
}

impl Match {
    pub fn pairing(white: PlayerId, black: PlayerId, round: u32) -> Self {
        Self {
            white,
            black: Some(black),
            white_team: None,
            black_team: None,
            round,
            outcome: None,
        }
    }

    pub fn bye(player: PlayerId, round: u32) -> Self {
        Self {
            white: player,
            black: None,
            white_team: None,
            black_team: None,
            round,
            outcome: None,
        }
    }

    pub fn is_bye(&self) -> bool {
        self.black.is_none()
    }

    pub fn involves(&self, player: PlayerId) -> bool {
        self.white == player || self.black == Some(player)
    }

    /// Fill in team ids from the edition roster
    pub fn with_teams(mut self, roster: &[RosterEntry]) -> Self {
        let team_of = |player: PlayerId| {
            roster
                .iter()
                .find(|entry| entry.player_id == player)
                .map(|entry| entry.team_id)
        };
        self.white_team = team_of(self.white);
        self.black_team = self.black.and_then(team_of);
        self
    }
}

/// A match persisted as part of a tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub tournament_id: TournamentId,
    #[serde(flatten)]
    pub pairing: Match,
}

impl Game {
    pub fn round(&self) -> u32 {
        self.pairing.round
    }

    pub fn is_decided(&self) -> bool {
        self.pairing.outcome.is_some()
    }
}

/// Tournament pairing system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentType {
    Swiss,
    RoundRobin,
}

impl TournamentType {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentType::Swiss => "swiss",
            TournamentType::RoundRobin => "round_robin",
        }
    }
}

/// Tournament lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    /// Created, not yet started
    Upcoming,
    /// Rounds are being played
    Ongoing,
    /// Terminal
    Finished,
}

impl TournamentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Upcoming => "upcoming",
            TournamentStatus::Ongoing => "ongoing",
            TournamentStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tournament record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    pub edition_id: EditionId,
    pub name: String,
    pub kind: TournamentType,
    pub status: TournamentStatus,
    /// `None` until activated
    pub current_round: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Tournament {
    /// Create an upcoming tournament
    pub fn new(id: TournamentId, edition_id: EditionId, name: String, kind: TournamentType) -> Self {
        Self {
            id,
            edition_id,
            name,
            kind,
            status: TournamentStatus::Upcoming,
            current_round: None,
            started_at: None,
            finished_at: None,
        }
    }
}

/// Team membership entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub player_id: PlayerId,
    /// Only players in play take part in pairing
    pub in_play: bool,
}

/// Team record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub members: Vec<TeamMember>,
    pub editions: Vec<EditionId>,
}

impl Team {
    pub fn new(id: TeamId, name: String) -> Self {
        Self {
            id,
            name,
            members: Vec::new(),
            editions: Vec::new(),
        }
    }

    /// Add a member, flagged in play
    pub fn with_player(mut self, player_id: PlayerId) -> Self {
        self.members.push(TeamMember {
            player_id,
            in_play: true,
        });
        self
    }

    /// Add a member who sits out of pairing
    pub fn with_reserve(mut self, player_id: PlayerId) -> Self {
        self.members.push(TeamMember {
            player_id,
            in_play: false,
        });
        self
    }
}

/// Competition edition: scope of team standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edition {
    pub id: EditionId,
    pub name: String,
    pub teams: Vec<TeamId>,
    pub tournaments: Vec<TournamentId>,
}

impl Edition {
    pub fn new(id: EditionId, name: String) -> Self {
        Self {
            id,
            name,
            teams: Vec::new(),
            tournaments: Vec::new(),
        }
    }
}

/// In-play player of an edition together with their team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: PlayerId,
    pub team_id: TeamId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_display() {
        assert_eq!(Score::from_half_points(3).to_string(), "1.5");
        assert_eq!(Score::from_half_points(4).to_string(), "2");
        assert_eq!(Score::ZERO.to_string(), "0");
    }

    #[test]
    fn test_score_sum() {
        let total: Score = [Score::WIN, Score::DRAW, Score::WIN].into_iter().sum();
        assert_eq!(total.half_points(), 5);
        assert!((total.as_points() - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_outcome_score_for() {
        assert_eq!(Outcome::WhiteWin.score_for(Color::White), Score::WIN);
        assert_eq!(Outcome::WhiteWin.score_for(Color::Black), Score::ZERO);
        assert_eq!(Outcome::BlackWin.score_for(Color::Black), Score::WIN);
        assert_eq!(Outcome::Draw.score_for(Color::White), Score::DRAW);
        assert_eq!(Outcome::Draw.score_for(Color::Black), Score::DRAW);
    }

    #[test]
    fn test_outcome_parse() {
        assert_eq!("white".parse::<Outcome>(), Ok(Outcome::WhiteWin));
        assert_eq!("1/2-1/2".parse::<Outcome>(), Ok(Outcome::Draw));
        assert_eq!("BLACK_WIN".parse::<Outcome>(), Ok(Outcome::BlackWin));
        assert!("resign".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_player_color_history() {
        let mut player = Player::new(7);
        assert!(!player.would_repeat_thrice(Color::White));

        player.colors = vec![Color::Black, Color::White, Color::White];
        assert_eq!(player.white_count(), 2);
        assert_eq!(player.black_count(), 1);
        assert_eq!(player.color_balance(), 1);
        assert!(player.would_repeat_thrice(Color::White));
        assert!(!player.would_repeat_thrice(Color::Black));
    }

    #[test]
    fn test_match_with_teams() {
        let roster = vec![
            RosterEntry {
                player_id: 1,
                team_id: 10,
            },
            RosterEntry {
                player_id: 2,
                team_id: 20,
            },
        ];

        let paired = Match::pairing(1, 2, 3).with_teams(&roster);
        assert_eq!(paired.white_team, Some(10));
        assert_eq!(paired.black_team, Some(20));

        let bye = Match::bye(2, 3).with_teams(&roster);
        assert!(bye.is_bye());
        assert_eq!(bye.white_team, Some(20));
        assert_eq!(bye.black_team, None);
    }

    #[test]
    fn test_game_serialization_flattens_pairing() {
        let game = Game {
            id: 5,
            tournament_id: 1,
            pairing: Match::pairing(1, 2, 1),
        };
        let json = serde_json::to_value(&game).unwrap();
        assert_eq!(json["white"], 1);
        assert_eq!(json["round"], 1);

        let back: Game = serde_json::from_value(json).unwrap();
        assert_eq!(back, game);
    }
}
