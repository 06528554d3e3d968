// Season dataset loading and validation.
//
// Reads the season JSON file (games, season team totals, season player totals,
// per-player game logs), normalizes its loosely-typed records into the
// strongly-typed model, and rejects malformed input once, here, so the
// formulas downstream can assume well-formed counts.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::analytics::stats::round1;
use crate::model::{
    Game, GameLogEntry, GameResult, Location, PlayerBoxScore, SeasonDataset, SeasonPlayerStats,
    SeasonTeamStats, StatLine,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// Raw JSON serde structs (private)
// ---------------------------------------------------------------------------

/// Top level of the season stats file. `games` is the only required key.
#[derive(Debug, Deserialize)]
struct RawSeasonFile {
    #[serde(default)]
    team: String,
    #[serde(default)]
    season: String,
    games: Vec<RawGame>,
    #[serde(default)]
    season_team_stats: Option<RawStatLine>,
    #[serde(default)]
    season_player_stats: Option<BTreeMap<String, RawStatLine>>,
    #[serde(default)]
    player_game_logs: Option<BTreeMap<String, Vec<RawLogEntry>>>,
}

#[derive(Debug, Deserialize)]
struct RawGame {
    #[serde(alias = "gameId")]
    game_id: u32,
    #[serde(default)]
    date: String,
    #[serde(default)]
    opponent: String,
    location: String,
    #[serde(alias = "vcScore")]
    vc_score: u32,
    #[serde(alias = "oppScore")]
    opp_score: u32,
    #[serde(default)]
    result: Option<String>,
    #[serde(default, alias = "teamStats")]
    team_stats: RawStatLine,
    #[serde(default, alias = "playerStats")]
    player_stats: Vec<RawStatLine>,
}

/// Any record carrying box-score counts: a team game line, a player game
/// line, a season aggregate, or a flat game-log entry. Game-sheet names
/// (`fg_made`, `fg_att`, `pts`, ...) are accepted as aliases; formatted
/// percentage fields are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStatLine {
    name: String,
    number: Option<serde_json::Value>,
    #[serde(alias = "gameId")]
    game_id: Option<u32>,
    result: Option<String>,
    games: Option<u32>,
    #[serde(alias = "points")]
    pts: Option<u32>,
    #[serde(alias = "plusMinus")]
    plus_minus: i32,
    ppg: Option<f64>,
    rpg: Option<f64>,
    apg: Option<f64>,
    win: u32,
    loss: u32,
    #[serde(alias = "fg_made")]
    fg: u32,
    #[serde(alias = "fg_att")]
    fga: u32,
    #[serde(alias = "fg3_made")]
    fg3: u32,
    #[serde(alias = "fg3_att")]
    fg3a: u32,
    #[serde(alias = "ft_made")]
    ft: u32,
    #[serde(alias = "ft_att")]
    fta: u32,
    oreb: u32,
    dreb: u32,
    reb: Option<u32>,
    #[serde(alias = "ast")]
    asst: u32,
    #[serde(alias = "tov")]
    to: u32,
    stl: u32,
    blk: u32,
    #[serde(alias = "pf")]
    fouls: u32,
}

/// Game-log entries come either with the player's line nested under `stats`
/// or with the counts inlined next to the game metadata. A `stats` key picks
/// the nested shape, so a bad nested line is an error rather than an empty
/// flat entry.
#[derive(Debug)]
enum RawLogEntry {
    Nested(RawNestedLogEntry),
    Flat(RawStatLine),
}

#[derive(Debug, Deserialize)]
struct RawNestedLogEntry {
    #[serde(alias = "gameId")]
    game_id: u32,
    #[serde(default)]
    result: Option<String>,
    stats: RawStatLine,
}

impl<'de> Deserialize<'de> for RawLogEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        let nested = map.contains_key("stats");
        let value = serde_json::Value::Object(map);
        let entry = if nested {
            serde_json::from_value(value).map(RawLogEntry::Nested)
        } else {
            serde_json::from_value(value).map(RawLogEntry::Flat)
        };
        entry.map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Raw → model conversion
// ---------------------------------------------------------------------------

impl RawStatLine {
    fn line(&self) -> StatLine {
        let split = self.oreb + self.dreb;
        // Sheets without an offensive/defensive split only carry `reb`.
        let reb = if split == 0 {
            self.reb.unwrap_or(0)
        } else {
            split
        };
        StatLine {
            fg: self.fg,
            fga: self.fga,
            fg3: self.fg3,
            fg3a: self.fg3a,
            ft: self.ft,
            fta: self.fta,
            oreb: self.oreb,
            dreb: self.dreb,
            reb,
            asst: self.asst,
            to: self.to,
            stl: self.stl,
            blk: self.blk,
            fouls: self.fouls,
        }
    }

    fn jersey_number(&self) -> Option<u32> {
        match &self.number {
            Some(serde_json::Value::Number(n)) => n.as_u64().map(|v| v as u32),
            Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn box_score(&self, fallback_name: &str) -> PlayerBoxScore {
        let line = self.line();
        let name = if self.name.trim().is_empty() {
            fallback_name.to_string()
        } else {
            self.name.trim().to_string()
        };
        PlayerBoxScore {
            name,
            number: self.jersey_number(),
            points: self.pts.unwrap_or_else(|| line.shooting_points()),
            plus_minus: self.plus_minus,
            line,
        }
    }
}

fn parse_result(raw: &str) -> Option<GameResult> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "W" | "WIN" => Some(GameResult::Win),
        "L" | "LOSS" => Some(GameResult::Loss),
        _ => None,
    }
}

/// A stored result string must agree with the one derived from scores.
fn check_stored_result(
    context: &str,
    stored: Option<&str>,
    derived: GameResult,
) -> Result<(), DatasetError> {
    let Some(raw) = stored.filter(|s| !s.trim().is_empty()) else {
        return Ok(());
    };
    match parse_result(raw) {
        Some(r) if r == derived => Ok(()),
        Some(_) => Err(DatasetError::Validation(format!(
            "{context}: stored result '{raw}' disagrees with score-derived result '{derived}'"
        ))),
        None => Err(DatasetError::Validation(format!(
            "{context}: unrecognized result '{raw}'"
        ))),
    }
}

/// Reject counts that violate made ≤ attempted and the 3PT-subset rules.
fn check_line(context: &str, line: &StatLine) -> Result<(), DatasetError> {
    let checks = [
        (line.fg <= line.fga, "fg exceeds fga"),
        (line.fg3 <= line.fg3a, "fg3 exceeds fg3a"),
        (line.ft <= line.fta, "ft exceeds fta"),
        (line.fg3 <= line.fg, "fg3 exceeds fg"),
        (line.fg3a <= line.fga, "fg3a exceeds fga"),
    ];
    for (ok, message) in checks {
        if !ok {
            return Err(DatasetError::Validation(format!("{context}: {message}")));
        }
    }
    Ok(())
}

fn convert_game(raw: &RawGame) -> Result<Game, DatasetError> {
    let context = format!("game {}", raw.game_id);
    if raw.game_id == 0 {
        return Err(DatasetError::Validation(
            "game ids must be positive integers".into(),
        ));
    }
    let location = Location::parse(&raw.location).ok_or_else(|| {
        DatasetError::Validation(format!("{context}: unknown location '{}'", raw.location))
    })?;
    let derived = GameResult::from_scores(raw.vc_score, raw.opp_score);
    check_stored_result(&context, raw.result.as_deref(), derived)?;

    let team_stats = raw.team_stats.line();
    check_line(&format!("{context} team stats"), &team_stats)?;

    let mut player_stats = Vec::with_capacity(raw.player_stats.len());
    for raw_player in &raw.player_stats {
        let player = raw_player.box_score("");
        if player.name.is_empty() {
            warn!("{}: skipping player line without a name", context);
            continue;
        }
        check_line(&format!("{context} player '{}'", player.name), &player.line)?;
        player_stats.push(player);
    }

    Ok(Game {
        game_id: raw.game_id,
        date: raw.date.trim().to_string(),
        opponent: raw.opponent.trim().to_string(),
        location,
        vc_score: raw.vc_score,
        opp_score: raw.opp_score,
        team_stats,
        player_stats,
    })
}

fn log_entry_for(game: &Game, stats: PlayerBoxScore) -> GameLogEntry {
    GameLogEntry {
        game_id: game.game_id,
        date: game.date.clone(),
        opponent: game.opponent.clone(),
        location: game.location,
        result: game.result(),
        team_score: game.vc_score,
        opp_score: game.opp_score,
        stats,
    }
}

/// Build game logs from each game's player lines, for files that omit them.
fn derive_game_logs(games: &[Game]) -> BTreeMap<String, Vec<GameLogEntry>> {
    let mut logs: BTreeMap<String, Vec<GameLogEntry>> = BTreeMap::new();
    for game in games {
        for player in &game.player_stats {
            logs.entry(player.name.clone())
                .or_default()
                .push(log_entry_for(game, player.clone()));
        }
    }
    logs
}

fn convert_game_logs(
    raw_logs: &BTreeMap<String, Vec<RawLogEntry>>,
    games: &[Game],
) -> Result<BTreeMap<String, Vec<GameLogEntry>>, DatasetError> {
    let by_id: HashMap<u32, &Game> = games.iter().map(|g| (g.game_id, g)).collect();
    let mut logs = BTreeMap::new();

    for (name, entries) in raw_logs {
        let mut seen = HashSet::new();
        let mut converted = Vec::with_capacity(entries.len());
        for entry in entries {
            let (game_id, result, raw_stats) = match entry {
                RawLogEntry::Nested(nested) => {
                    (Some(nested.game_id), nested.result.as_deref(), &nested.stats)
                }
                RawLogEntry::Flat(stats) => (stats.game_id, stats.result.as_deref(), stats),
            };
            let game_id = game_id.ok_or_else(|| {
                DatasetError::Validation(format!("game log for '{name}': entry without a game id"))
            })?;
            let game = by_id.get(&game_id).ok_or_else(|| {
                DatasetError::Validation(format!(
                    "game log for '{name}' references unknown game {game_id}"
                ))
            })?;
            if !seen.insert(game_id) {
                return Err(DatasetError::Validation(format!(
                    "game log for '{name}' lists game {game_id} more than once"
                )));
            }
            let context = format!("game log for '{name}', game {game_id}");
            check_stored_result(&context, result, game.result())?;

            let stats = raw_stats.box_score(name);
            check_line(&context, &stats.line)?;
            converted.push(log_entry_for(game, stats));
        }
        converted.sort_by_key(|e| e.game_id);
        logs.insert(name.clone(), converted);
    }
    Ok(logs)
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Sum every game's team box score into a season aggregate.
pub fn aggregate_team(games: &[Game]) -> SeasonTeamStats {
    let totals: StatLine = games.iter().map(|g| &g.team_stats).sum();
    let win = games.iter().filter(|g| g.result().is_win()).count() as u32;
    let loss = games.len() as u32 - win;
    let n = games.len() as f64;
    let points: u32 = games.iter().map(|g| g.vc_score).sum();
    let per_game = |v: u32| if n > 0.0 { round1(v as f64 / n) } else { 0.0 };
    SeasonTeamStats {
        win,
        loss,
        ppg: per_game(points),
        rpg: per_game(totals.reb),
        apg: per_game(totals.asst),
        totals,
    }
}

/// Sum one player's game log into a season aggregate.
pub fn aggregate_player(name: &str, log: &[GameLogEntry]) -> SeasonPlayerStats {
    let totals: StatLine = log.iter().map(|e| &e.stats.line).sum();
    let points: u32 = log.iter().map(|e| e.stats.points).sum();
    let plus_minus: i32 = log.iter().map(|e| e.stats.plus_minus).sum();
    let games = log.len() as u32;
    let per_game = |v: u32| {
        if games > 0 {
            round1(v as f64 / games as f64)
        } else {
            0.0
        }
    };
    SeasonPlayerStats {
        name: name.to_string(),
        games,
        points,
        plus_minus,
        ppg: per_game(points),
        rpg: per_game(totals.reb),
        apg: per_game(totals.asst),
        totals,
    }
}

fn convert_season_team(raw: &RawStatLine, games: &[Game]) -> SeasonTeamStats {
    let totals = raw.line();
    let total_games = raw.win + raw.loss;
    let per_game = |stored: Option<f64>, total: u32| {
        stored.unwrap_or_else(|| {
            if total_games > 0 {
                round1(total as f64 / total_games as f64)
            } else {
                0.0
            }
        })
    };
    let points = raw
        .pts
        .unwrap_or_else(|| games.iter().map(|g| g.vc_score).sum());
    SeasonTeamStats {
        win: raw.win,
        loss: raw.loss,
        ppg: per_game(raw.ppg, points),
        rpg: per_game(raw.rpg, totals.reb),
        apg: per_game(raw.apg, totals.asst),
        totals,
    }
}

fn convert_season_player(
    key: &str,
    raw: &RawStatLine,
    log: &[GameLogEntry],
) -> Result<SeasonPlayerStats, DatasetError> {
    let totals = raw.line();
    check_line(&format!("season stats for '{key}'"), &totals)?;
    let games = raw.games.unwrap_or(log.len() as u32);
    let points = match (raw.pts, raw.ppg) {
        (Some(pts), _) => pts,
        (None, Some(ppg)) => (ppg * games as f64).round() as u32,
        (None, None) => log.iter().map(|e| e.stats.points).sum(),
    };
    let per_game = |stored: Option<f64>, total: u32| {
        stored.unwrap_or_else(|| {
            if games > 0 {
                round1(total as f64 / games as f64)
            } else {
                0.0
            }
        })
    };
    Ok(SeasonPlayerStats {
        name: if raw.name.trim().is_empty() {
            key.to_string()
        } else {
            raw.name.trim().to_string()
        },
        games,
        points,
        plus_minus: raw.plus_minus,
        ppg: per_game(raw.ppg, points),
        rpg: per_game(raw.rpg, totals.reb),
        apg: per_game(raw.apg, totals.asst),
        totals,
    })
}

// ---------------------------------------------------------------------------
// Build + loaders
// ---------------------------------------------------------------------------

fn build_dataset(raw: RawSeasonFile) -> Result<SeasonDataset, DatasetError> {
    let mut seen = HashSet::new();
    let mut games = Vec::with_capacity(raw.games.len());
    for raw_game in &raw.games {
        if !seen.insert(raw_game.game_id) {
            return Err(DatasetError::Validation(format!(
                "duplicate game id {}",
                raw_game.game_id
            )));
        }
        games.push(convert_game(raw_game)?);
    }
    games.sort_by_key(|g| g.game_id);

    let player_game_logs = match &raw.player_game_logs {
        Some(logs) if !logs.is_empty() => convert_game_logs(logs, &games)?,
        _ => {
            debug!("no game logs in dataset, deriving from game player lines");
            derive_game_logs(&games)
        }
    };

    let season_team_stats = match &raw.season_team_stats {
        Some(team) => {
            check_line("season team stats", &team.line())?;
            convert_season_team(team, &games)
        }
        None => {
            debug!("no season team stats in dataset, aggregating from games");
            aggregate_team(&games)
        }
    };

    let season_player_stats = match &raw.season_player_stats {
        Some(players) if !players.is_empty() => {
            let mut out = BTreeMap::new();
            for (key, player) in players {
                let log = player_game_logs
                    .get(key)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);
                out.insert(key.clone(), convert_season_player(key, player, log)?);
            }
            out
        }
        _ => {
            debug!("no season player stats in dataset, aggregating from game logs");
            player_game_logs
                .iter()
                .map(|(name, log)| (name.clone(), aggregate_player(name, log)))
                .collect()
        }
    };

    Ok(SeasonDataset {
        team: raw.team.trim().to_string(),
        season: raw.season.trim().to_string(),
        games,
        season_team_stats,
        season_player_stats,
        player_game_logs,
    })
}

/// Parse and validate a season dataset from raw JSON bytes. `origin` names the
/// source in error messages.
pub fn parse_dataset(bytes: &[u8], origin: &str) -> Result<SeasonDataset, DatasetError> {
    let raw: RawSeasonFile = serde_json::from_slice(bytes).map_err(|e| DatasetError::Json {
        path: origin.to_string(),
        source: e,
    })?;
    build_dataset(raw)
}

/// Load a season dataset from a JSON file.
pub fn load_dataset(path: &Path) -> Result<SeasonDataset, DatasetError> {
    let (dataset, _) = load_dataset_with_fingerprint(path)?;
    Ok(dataset)
}

/// Load a season dataset and return it with the fingerprint of the file
/// bytes it was parsed from.
pub fn load_dataset_with_fingerprint(path: &Path) -> Result<(SeasonDataset, String), DatasetError> {
    let bytes = std::fs::read(path).map_err(|e| DatasetError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    let dataset = parse_dataset(&bytes, &path.display().to_string())?;
    info!(
        "loaded {} games and {} players from {}",
        dataset.games.len(),
        dataset.season_player_stats.len(),
        path.display()
    );
    Ok((dataset, fingerprint(&bytes)))
}

/// Hex SHA-256 of the raw dataset bytes; changes whenever the file does.
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
