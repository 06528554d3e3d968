// Single-game efficiency, using the game's final score as points.

use serde::Serialize;

use crate::analytics::stats::{efg_pct, est_possessions, pct, round1, round2, round3, safe_div, ts_pct};
use crate::model::{Game, GameResult, Location};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameAdvancedStats {
    pub game_id: u32,
    pub date: String,
    pub opponent: String,
    pub location: Location,
    pub result: GameResult,
    pub score: String,
    pub efficiency: GameEfficiency,
    pub possession: GamePossession,
    pub ball_movement: GameBallMovement,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameEfficiency {
    pub ppp: f64,
    pub efg_pct: f64,
    pub ts_pct: f64,
    pub fg_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GamePossession {
    pub est_poss: f64,
    pub to_per_100: f64,
    pub ast_to_ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameBallMovement {
    pub assists: u32,
    pub ast_pct: f64,
}

/// Metrics for one game.
pub fn game_advanced(game: &Game) -> GameAdvancedStats {
    let t = &game.team_stats;
    let est_poss = est_possessions(t);
    let points = game.vc_score as f64;
    GameAdvancedStats {
        game_id: game.game_id,
        date: game.date.clone(),
        opponent: game.opponent.clone(),
        location: game.location,
        result: game.result(),
        score: format!("{}-{}", game.vc_score, game.opp_score),
        efficiency: GameEfficiency {
            ppp: round3(safe_div(points, est_poss)),
            efg_pct: round1(efg_pct(t)),
            ts_pct: round1(ts_pct(points, t)),
            fg_pct: round1(t.fg_pct()),
        },
        possession: GamePossession {
            est_poss: round1(est_poss),
            to_per_100: round1(pct(t.to as f64, est_poss)),
            ast_to_ratio: round2(safe_div(t.asst as f64, t.to as f64)),
        },
        ball_movement: GameBallMovement {
            assists: t.asst,
            ast_pct: round1(pct(t.asst as f64, t.fg as f64)),
        },
    }
}

/// Look up a game by id and compute its metrics. Unknown ids are `None`.
pub fn compute_game_advanced(games: &[Game], game_id: u32) -> Option<GameAdvancedStats> {
    games
        .iter()
        .find(|g| g.game_id == game_id)
        .map(game_advanced)
}
