// Per-game series for charts and exports, ordered by game id.

use serde::Serialize;

use crate::analytics::stats::round1;
use crate::model::{Game, GameLogEntry, GameResult};

/// Team series, one element per game.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamTrends {
    pub games: Vec<u32>,
    pub opponents: Vec<String>,
    pub dates: Vec<String>,
    pub results: Vec<GameResult>,
    pub vc_score: Vec<u32>,
    pub opp_score: Vec<u32>,
    pub fg_pct: Vec<f64>,
    pub fg3_pct: Vec<f64>,
    pub asst: Vec<u32>,
    pub to: Vec<u32>,
    pub reb: Vec<u32>,
    pub oreb: Vec<u32>,
    pub dreb: Vec<u32>,
    pub stl: Vec<u32>,
    pub blk: Vec<u32>,
    pub ft: Vec<u32>,
    pub fta: Vec<u32>,
}

impl TeamTrends {
    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }
}

/// One player's series, one element per game appeared in.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlayerTrends {
    pub name: String,
    pub games: Vec<u32>,
    pub opponents: Vec<String>,
    pub dates: Vec<String>,
    pub pts: Vec<u32>,
    pub fg: Vec<u32>,
    pub fg_att: Vec<u32>,
    pub fg3: Vec<u32>,
    pub asst: Vec<u32>,
    pub reb: Vec<u32>,
    pub stl: Vec<u32>,
    pub plus_minus: Vec<i32>,
    pub to: Vec<u32>,
    pub fouls: Vec<u32>,
}

pub fn compute_team_trends(games: &[Game]) -> TeamTrends {
    let mut ordered: Vec<&Game> = games.iter().collect();
    ordered.sort_by_key(|g| g.game_id);

    let mut t = TeamTrends::default();
    for g in ordered {
        let s = &g.team_stats;
        t.games.push(g.game_id);
        t.opponents.push(g.opponent.clone());
        t.dates.push(g.date.clone());
        t.results.push(g.result());
        t.vc_score.push(g.vc_score);
        t.opp_score.push(g.opp_score);
        t.fg_pct.push(round1(s.fg_pct()));
        t.fg3_pct.push(round1(s.fg3_pct()));
        t.asst.push(s.asst);
        t.to.push(s.to);
        t.reb.push(s.reb);
        t.oreb.push(s.oreb);
        t.dreb.push(s.dreb);
        t.stl.push(s.stl);
        t.blk.push(s.blk);
        t.ft.push(s.ft);
        t.fta.push(s.fta);
    }
    t
}

/// Series for one player. `None` when the player has no game log.
pub fn compute_player_trends(name: &str, log: &[GameLogEntry]) -> Option<PlayerTrends> {
    if log.is_empty() {
        return None;
    }
    let mut ordered: Vec<&GameLogEntry> = log.iter().collect();
    ordered.sort_by_key(|e| e.game_id);

    let mut t = PlayerTrends {
        name: name.to_string(),
        ..PlayerTrends::default()
    };
    for e in ordered {
        let s = &e.stats.line;
        t.games.push(e.game_id);
        t.opponents.push(e.opponent.clone());
        t.dates.push(e.date.clone());
        t.pts.push(e.stats.points);
        t.fg.push(s.fg);
        t.fg_att.push(s.fga);
        t.fg3.push(s.fg3);
        t.asst.push(s.asst);
        t.reb.push(s.reb);
        t.stl.push(s.stl);
        t.plus_minus.push(e.stats.plus_minus);
        t.to.push(s.to);
        t.fouls.push(s.fouls);
    }
    Some(t)
}
