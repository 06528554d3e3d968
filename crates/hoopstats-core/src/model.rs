// Validated, strongly-typed season data. Built once by `dataset` and never
// mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::AddAssign;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Counting stats
// ---------------------------------------------------------------------------

/// Box-score counting stats shared by team games, player games, and season
/// aggregates.
///
/// Percentages are never stored; they are recomputed from made/attempted
/// counts on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatLine {
    pub fg: u32,
    pub fga: u32,
    pub fg3: u32,
    pub fg3a: u32,
    pub ft: u32,
    pub fta: u32,
    pub oreb: u32,
    pub dreb: u32,
    pub reb: u32,
    pub asst: u32,
    pub to: u32,
    pub stl: u32,
    pub blk: u32,
    pub fouls: u32,
}

/// A team's counting stats for one game (or summed over a season).
pub type TeamBoxScore = StatLine;

impl StatLine {
    /// Two-point field goals made.
    pub fn fg2(&self) -> u32 {
        self.fg.saturating_sub(self.fg3)
    }

    /// Two-point field goals attempted.
    pub fn fg2a(&self) -> u32 {
        self.fga.saturating_sub(self.fg3a)
    }

    pub fn missed_fg(&self) -> u32 {
        self.fga.saturating_sub(self.fg)
    }

    pub fn missed_ft(&self) -> u32 {
        self.fta.saturating_sub(self.ft)
    }

    /// Points implied by the shooting line (2s, 3s, and free throws).
    pub fn shooting_points(&self) -> u32 {
        self.fg2() * 2 + self.fg3 * 3 + self.ft
    }

    /// Unrounded FG%, 0 when there are no attempts.
    pub fn fg_pct(&self) -> f64 {
        ratio_pct(self.fg, self.fga)
    }

    pub fn fg2_pct(&self) -> f64 {
        ratio_pct(self.fg2(), self.fg2a())
    }

    pub fn fg3_pct(&self) -> f64 {
        ratio_pct(self.fg3, self.fg3a)
    }

    pub fn ft_pct(&self) -> f64 {
        ratio_pct(self.ft, self.fta)
    }
}

fn ratio_pct(made: u32, attempted: u32) -> f64 {
    if attempted == 0 {
        0.0
    } else {
        made as f64 / attempted as f64 * 100.0
    }
}

impl AddAssign<&StatLine> for StatLine {
    fn add_assign(&mut self, other: &StatLine) {
        self.fg += other.fg;
        self.fga += other.fga;
        self.fg3 += other.fg3;
        self.fg3a += other.fg3a;
        self.ft += other.ft;
        self.fta += other.fta;
        self.oreb += other.oreb;
        self.dreb += other.dreb;
        self.reb += other.reb;
        self.asst += other.asst;
        self.to += other.to;
        self.stl += other.stl;
        self.blk += other.blk;
        self.fouls += other.fouls;
    }
}

impl<'a> Sum<&'a StatLine> for StatLine {
    fn sum<I: Iterator<Item = &'a StatLine>>(iter: I) -> Self {
        let mut total = StatLine::default();
        for line in iter {
            total += line;
        }
        total
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Location {
    #[serde(rename = "home")]
    Home,
    #[serde(rename = "away")]
    Away,
}

impl Location {
    /// Parse a location string case-insensitively ("Home", "away", ...).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" | "h" => Some(Location::Home),
            "away" | "a" => Some(Location::Away),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Home => "home",
            Location::Away => "away",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GameResult {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

impl GameResult {
    /// Win iff the team outscored the opponent.
    pub fn from_scores(vc_score: u32, opp_score: u32) -> Self {
        if vc_score > opp_score {
            GameResult::Win
        } else {
            GameResult::Loss
        }
    }

    pub fn letter(&self) -> &'static str {
        match self {
            GameResult::Win => "W",
            GameResult::Loss => "L",
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self, GameResult::Win)
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.letter())
    }
}

/// One player's line in a single game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerBoxScore {
    pub name: String,
    pub number: Option<u32>,
    pub points: u32,
    pub plus_minus: i32,
    #[serde(flatten)]
    pub line: StatLine,
}

/// One completed contest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Game {
    pub game_id: u32,
    pub date: String,
    pub opponent: String,
    pub location: Location,
    pub vc_score: u32,
    pub opp_score: u32,
    pub team_stats: TeamBoxScore,
    pub player_stats: Vec<PlayerBoxScore>,
}

impl Game {
    pub fn result(&self) -> GameResult {
        GameResult::from_scores(self.vc_score, self.opp_score)
    }

    /// Absolute final margin.
    pub fn margin(&self) -> u32 {
        self.vc_score.abs_diff(self.opp_score)
    }
}

// ---------------------------------------------------------------------------
// Season aggregates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonTeamStats {
    pub win: u32,
    pub loss: u32,
    pub ppg: f64,
    pub rpg: f64,
    pub apg: f64,
    #[serde(flatten)]
    pub totals: StatLine,
}

impl SeasonTeamStats {
    pub fn total_games(&self) -> u32 {
        self.win + self.loss
    }

    /// Season points reconstructed from the stored average.
    pub fn season_points(&self) -> f64 {
        self.ppg * self.total_games() as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonPlayerStats {
    pub name: String,
    /// Games this player appeared in (may be fewer than the team played).
    pub games: u32,
    pub points: u32,
    pub plus_minus: i32,
    pub ppg: f64,
    pub rpg: f64,
    pub apg: f64,
    #[serde(flatten)]
    pub totals: StatLine,
}

/// A single game-log entry: one game a player appeared in, joined to the
/// game's final score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameLogEntry {
    pub game_id: u32,
    pub date: String,
    pub opponent: String,
    pub location: Location,
    pub result: GameResult,
    pub team_score: u32,
    pub opp_score: u32,
    pub stats: PlayerBoxScore,
}

impl GameLogEntry {
    pub fn margin(&self) -> u32 {
        self.team_score.abs_diff(self.opp_score)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Everything the engine consumes for one season.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonDataset {
    pub team: String,
    pub season: String,
    /// Sorted by `game_id`.
    pub games: Vec<Game>,
    pub season_team_stats: SeasonTeamStats,
    pub season_player_stats: BTreeMap<String, SeasonPlayerStats>,
    /// Per player, ordered by `game_id`. A player missing from a game has no
    /// entry for it.
    pub player_game_logs: BTreeMap<String, Vec<GameLogEntry>>,
}

impl SeasonDataset {
    pub fn game(&self, game_id: u32) -> Option<&Game> {
        self.games.iter().find(|g| g.game_id == game_id)
    }

    pub fn player(&self, name: &str) -> Option<&SeasonPlayerStats> {
        self.season_player_stats.get(name)
    }

    /// Game log for a player; empty when the player has none.
    pub fn game_log(&self, name: &str) -> &[GameLogEntry] {
        self.player_game_logs
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
