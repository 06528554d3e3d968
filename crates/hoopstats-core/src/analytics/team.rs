// Season-level team efficiency, shot mix, possession control, ball movement,
// defense and discipline.

use serde::Serialize;

use crate::analytics::stats::{
    efg_pct, est_possessions, pct, round1, round2, round3, safe_div, shooting_possessions, ts_pct,
};
use crate::model::{Game, SeasonTeamStats};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamAdvancedStats {
    pub games_played: u32,
    pub scoring_efficiency: TeamScoring,
    pub shot_mix: ShotMix,
    pub possession_control: PossessionControl,
    pub ball_movement: BallMovement,
    pub defense: TeamDefense,
    pub discipline: TeamDiscipline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamScoring {
    pub ppg: f64,
    pub points: f64,
    pub ppp: f64,
    pub fg_pct: f64,
    pub fg2_made: u32,
    pub fg2_att: u32,
    pub fg2_pct: f64,
    pub fg3_pct: f64,
    pub ft_pct: f64,
    pub efg_pct: f64,
    pub ts_pct: f64,
    pub pts_per_shot: f64,
    pub pts_per_fga: f64,
    pub pts_per_fta: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotMix {
    pub fg3_attempt_rate: f64,
    pub ft_rate: f64,
    pub inside_scoring_reliance: f64,
    pub shot_balance: ShotBalance,
}

/// Share of total points by source. The three shares sum to 100 up to
/// independent rounding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShotBalance {
    #[serde(rename = "2pt_share")]
    pub two_pt_share: f64,
    #[serde(rename = "3pt_share")]
    pub three_pt_share: f64,
    pub ft_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PossessionControl {
    pub est_possessions: f64,
    pub to_per_poss: f64,
    pub to_per_100: f64,
    pub ast_to_ratio: f64,
    pub reb_per_poss: f64,
    /// `oreb / (reb × 2) × 100`. A proxy only: a true offensive rebound rate
    /// needs opponent boards, which box scores here do not carry.
    pub oreb_rate_estimate: f64,
    /// Same proxy as `oreb_rate_estimate`, for defensive boards.
    pub dreb_rate_estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallMovement {
    pub apg: f64,
    pub ast_per_fg: f64,
    pub assisted_scoring_rate: f64,
    pub isolation_reliance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDefense {
    pub spg: f64,
    pub bpg: f64,
    pub stl_blk_per_poss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamDiscipline {
    pub fpg: f64,
    pub fta_per_game: f64,
}

/// Share of shots that were assisted, capped at 100.
pub(crate) fn assisted_rate(asst: u32, fg: u32) -> f64 {
    pct(asst as f64, fg as f64).min(100.0)
}

/// Compute season team metrics. Returns `None` when no games were played.
pub fn compute_team_advanced(
    team: &SeasonTeamStats,
    games: &[Game],
) -> Option<TeamAdvancedStats> {
    let total_games = team.total_games();
    if total_games == 0 || games.is_empty() {
        return None;
    }
    let g = total_games as f64;
    let t = &team.totals;
    let est_poss = est_possessions(t);
    let points = team.season_points();
    let fga = t.fga as f64;

    let two_pt_points = (t.fg2() * 2) as f64;
    let three_pt_points = (t.fg3 * 3) as f64;
    let assisted = assisted_rate(t.asst, t.fg);

    Some(TeamAdvancedStats {
        games_played: total_games,
        scoring_efficiency: TeamScoring {
            ppg: team.ppg,
            points: round1(points),
            ppp: round3(safe_div(points, est_poss)),
            fg_pct: round1(t.fg_pct()),
            fg2_made: t.fg2(),
            fg2_att: t.fg2a(),
            fg2_pct: round1(t.fg2_pct()),
            fg3_pct: round1(t.fg3_pct()),
            ft_pct: round1(t.ft_pct()),
            efg_pct: round1(efg_pct(t)),
            ts_pct: round1(ts_pct(points, t)),
            pts_per_shot: round2(safe_div(points, shooting_possessions(t))),
            pts_per_fga: round2(safe_div(points, fga)),
            pts_per_fta: round2(safe_div(points, t.fta as f64)),
        },
        shot_mix: ShotMix {
            fg3_attempt_rate: round1(pct(t.fg3a as f64, fga)),
            ft_rate: round1(pct(t.fta as f64, fga)),
            inside_scoring_reliance: round1(pct(t.fg2a() as f64, fga)),
            shot_balance: ShotBalance {
                two_pt_share: round1(pct(two_pt_points, points)),
                three_pt_share: round1(pct(three_pt_points, points)),
                ft_share: round1(pct(t.ft as f64, points)),
            },
        },
        possession_control: PossessionControl {
            est_possessions: round1(est_poss),
            to_per_poss: round3(safe_div(t.to as f64, est_poss)),
            to_per_100: round1(pct(t.to as f64, est_poss)),
            ast_to_ratio: round2(safe_div(t.asst as f64, t.to as f64)),
            reb_per_poss: round3(safe_div(team.rpg, est_poss / g)),
            oreb_rate_estimate: round1(pct(t.oreb as f64, (t.reb * 2) as f64)),
            dreb_rate_estimate: round1(pct(t.dreb as f64, (t.reb * 2) as f64)),
        },
        ball_movement: BallMovement {
            apg: team.apg,
            ast_per_fg: round2(safe_div(t.asst as f64, t.fg as f64)),
            assisted_scoring_rate: round1(assisted),
            isolation_reliance: round1(100.0 - assisted),
        },
        defense: TeamDefense {
            spg: round1(t.stl as f64 / g),
            bpg: round1(t.blk as f64 / g),
            stl_blk_per_poss: round3(safe_div((t.stl + t.blk) as f64, est_poss)),
        },
        discipline: TeamDiscipline {
            fpg: round1(t.fouls as f64 / g),
            fta_per_game: round1(t.fta as f64 / g),
        },
    })
}
