// Per-player advanced metrics: shooting efficiency, usage and role, ball
// handling, rebounding, defensive activity, consistency, clutch and matchup
// splits, and on-court impact.

use std::fmt;

use serde::Serialize;

use crate::analytics::stats::{
    efg_pct, mean, pct, round1, round2, safe_div, sample_variance, shooting_possessions, ts_pct,
    FREE_THROW_POSSESSION_FACTOR,
};
use crate::analytics::EngineOptions;
use crate::model::{GameLogEntry, SeasonDataset, StatLine};

/// Scoring share at or above which a player is a primary scorer.
pub const PRIMARY_SCORER_SHARE: f64 = 20.0;

/// Scoring share at or above which a player is a secondary scorer.
pub const SECONDARY_SCORER_SHARE: f64 = 10.0;

// ---------------------------------------------------------------------------
// Role and grade
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerRole {
    #[serde(rename = "Primary Scorer")]
    PrimaryScorer,
    #[serde(rename = "Secondary Scorer")]
    SecondaryScorer,
    Playmaker,
    Rebounder,
    Shooter,
    #[serde(rename = "Role Player")]
    RolePlayer,
    #[serde(rename = "All-Around")]
    AllAround,
}

impl PlayerRole {
    pub fn label(&self) -> &'static str {
        match self {
            PlayerRole::PrimaryScorer => "Primary Scorer",
            PlayerRole::SecondaryScorer => "Secondary Scorer",
            PlayerRole::Playmaker => "Playmaker",
            PlayerRole::Rebounder => "Rebounder",
            PlayerRole::Shooter => "Shooter",
            PlayerRole::RolePlayer => "Role Player",
            PlayerRole::AllAround => "All-Around",
        }
    }
}

impl fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule cascade over per-game production and usage. Rules are checked in
/// order and the first match wins; reordering changes results.
pub fn classify_role(ppg: f64, rpg: f64, apg: f64, usage: f64) -> PlayerRole {
    if ppg >= 20.0 && usage >= 25.0 {
        PlayerRole::PrimaryScorer
    } else if ppg >= 15.0 && usage >= 20.0 {
        PlayerRole::SecondaryScorer
    } else if apg >= 4.0 && usage >= 15.0 {
        PlayerRole::Playmaker
    } else if rpg >= 8.0 {
        PlayerRole::Rebounder
    } else if ppg >= 12.0 {
        PlayerRole::Shooter
    } else if ppg < 8.0 && rpg < 5.0 && apg < 3.0 {
        PlayerRole::RolePlayer
    } else {
        PlayerRole::AllAround
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum EfficiencyGrade {
    A,
    B,
    C,
    D,
}

impl EfficiencyGrade {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= 20.0 {
            EfficiencyGrade::A
        } else if rating >= 15.0 {
            EfficiencyGrade::B
        } else if rating >= 10.0 {
            EfficiencyGrade::C
        } else {
            EfficiencyGrade::D
        }
    }
}

impl fmt::Display for EfficiencyGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EfficiencyGrade::A => "A",
            EfficiencyGrade::B => "B",
            EfficiencyGrade::C => "C",
            EfficiencyGrade::D => "D",
        };
        f.write_str(s)
    }
}

/// Linear box-score efficiency per game:
/// `(pts + reb + ast + stl + blk − missed FG − missed FT − to) / games`.
///
/// This is a simple additive rating and is not the official PER formula.
pub fn efficiency_rating(points: u32, line: &StatLine, games: u32) -> f64 {
    let positive = (points + line.reb + line.asst + line.stl + line.blk) as f64;
    let negative = (line.missed_fg() + line.missed_ft() + line.to) as f64;
    safe_div(positive - negative, games as f64)
}

/// `(fga + 0.44·fta + to) / (team fga + 0.44·team fta + team to) × 100`.
///
/// Uses season-total team possessions as the denominator, so it ignores the
/// player's share of minutes.
pub fn usage_proxy(player: &StatLine, team: &StatLine) -> f64 {
    let used = |l: &StatLine| {
        l.fga as f64 + FREE_THROW_POSSESSION_FACTOR * l.fta as f64 + l.to as f64
    };
    pct(used(player), used(team))
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerAdvancedStats {
    pub name: String,
    pub games: u32,
    pub scoring_efficiency: PlayerScoring,
    pub usage_role: UsageRole,
    pub ball_handling: BallHandling,
    pub rebounding: Rebounding,
    pub defense_activity: DefenseActivity,
    pub discipline: PlayerDiscipline,
    pub consistency: Consistency,
    pub clutch_performance: ClutchPerformance,
    pub matchup_performance: MatchupPerformance,
    pub impact: Impact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerScoring {
    pub ppg: f64,
    pub pts_per_shot: f64,
    pub pts_per_fga: f64,
    pub efg_pct: f64,
    pub ts_pct: f64,
    pub fg_pct: f64,
    pub fg2_pct: f64,
    pub fg3_pct: f64,
    pub ft_pct: f64,
    pub efficiency_rating: f64,
    pub efficiency_grade: EfficiencyGrade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageRole {
    pub usage_proxy: f64,
    pub shot_volume_share: f64,
    pub scoring_share: f64,
    pub to_rate: f64,
    pub role: PlayerRole,
    pub primary_scorer: bool,
    pub secondary_scorer: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BallHandling {
    pub apg: f64,
    pub ast_to_ratio: f64,
    pub total_assists: u32,
    pub total_turnovers: u32,
    pub tpg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rebounding {
    pub rpg: f64,
    pub oreb: u32,
    pub dreb: u32,
    pub reb_share: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefenseActivity {
    pub spg: f64,
    pub bpg: f64,
    pub total_stl: u32,
    pub total_blk: u32,
    pub stocks_per_game: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerDiscipline {
    pub fpg: f64,
    pub total_fouls: u32,
}

/// `consistency_score` is `100 − pts_variance` and goes negative for very
/// streaky scorers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consistency {
    pub pts_variance: f64,
    pub fg_pct_variance: f64,
    pub games_played: u32,
    pub consistency_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClutchPerformance {
    pub clutch_games: u32,
    pub clutch_ppg: f64,
    pub clutch_fg_pct: f64,
    pub clutch_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchupPerformance {
    pub strong_opponent_games: u32,
    pub vs_strong_teams_ppg: f64,
    pub strong_team_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Impact {
    pub plus_minus: i32,
    pub pm_per_game: f64,
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

fn points_series(log: &[GameLogEntry]) -> Vec<f64> {
    log.iter().map(|e| e.stats.points as f64).collect()
}

fn consistency(log: &[GameLogEntry], games: u32) -> Consistency {
    let pts_variance = sample_variance(&points_series(log));
    let fg_pcts: Vec<f64> = log
        .iter()
        .filter(|e| e.stats.line.fga > 0)
        .map(|e| e.stats.line.fg_pct())
        .collect();
    Consistency {
        pts_variance: round1(pts_variance),
        fg_pct_variance: round1(sample_variance(&fg_pcts)),
        games_played: games,
        consistency_score: round1(100.0 - pts_variance),
    }
}

/// Games decided by the clutch margin or less, judged on the final score.
fn clutch(log: &[GameLogEntry], ppg: f64, margin: u32) -> ClutchPerformance {
    let close: Vec<&GameLogEntry> = log.iter().filter(|e| e.margin() <= margin).collect();
    let clutch_ppg = mean(
        &close
            .iter()
            .map(|e| e.stats.points as f64)
            .collect::<Vec<_>>(),
    );
    let made: u32 = close.iter().map(|e| e.stats.line.fg).sum();
    let attempted: u32 = close.iter().map(|e| e.stats.line.fga).sum();
    ClutchPerformance {
        clutch_games: close.len() as u32,
        clutch_ppg: round1(clutch_ppg),
        clutch_fg_pct: round1(pct(made as f64, attempted as f64)),
        clutch_factor: round2(safe_div(clutch_ppg, ppg)),
    }
}

/// Scoring against opponents that put up at least `strong_score`. With no
/// such games the season ppg stands in.
fn matchup(log: &[GameLogEntry], ppg: f64, strong_score: u32) -> MatchupPerformance {
    let strong: Vec<f64> = log
        .iter()
        .filter(|e| e.opp_score >= strong_score)
        .map(|e| e.stats.points as f64)
        .collect();
    let vs_strong = if strong.is_empty() { ppg } else { mean(&strong) };
    MatchupPerformance {
        strong_opponent_games: strong.len() as u32,
        vs_strong_teams_ppg: round1(vs_strong),
        strong_team_factor: round2(safe_div(vs_strong, ppg)),
    }
}

/// Compute a player's advanced metrics.
///
/// Returns `None` for an unknown player or one with zero games.
pub fn compute_player_advanced(
    dataset: &SeasonDataset,
    name: &str,
    options: &EngineOptions,
) -> Option<PlayerAdvancedStats> {
    let player = dataset.player(name)?;
    if player.games == 0 {
        return None;
    }
    let team = &dataset.season_team_stats;
    let log = dataset.game_log(name);
    let games = player.games;
    let g = games as f64;
    let p = &player.totals;
    let points = player.points as f64;
    let fga = p.fga as f64;

    let usage = usage_proxy(p, &team.totals);
    let shot_volume_share = pct(fga, team.totals.fga as f64);
    let scoring_share = pct(points, team.season_points());
    let apg = p.asst as f64 / g;
    let rpg = p.reb as f64 / g;
    let rating = efficiency_rating(player.points, p, games);

    Some(PlayerAdvancedStats {
        name: player.name.clone(),
        games,
        scoring_efficiency: PlayerScoring {
            ppg: player.ppg,
            pts_per_shot: round2(safe_div(points, shooting_possessions(p))),
            pts_per_fga: round2(safe_div(points, fga)),
            efg_pct: round1(efg_pct(p)),
            ts_pct: round1(ts_pct(points, p)),
            fg_pct: round1(p.fg_pct()),
            fg2_pct: round1(p.fg2_pct()),
            fg3_pct: round1(p.fg3_pct()),
            ft_pct: round1(p.ft_pct()),
            efficiency_rating: round1(rating),
            efficiency_grade: EfficiencyGrade::from_rating(rating),
        },
        usage_role: UsageRole {
            usage_proxy: round1(usage),
            shot_volume_share: round1(shot_volume_share),
            scoring_share: round1(scoring_share),
            to_rate: round1(pct(
                p.to as f64,
                shooting_possessions(p) + p.to as f64,
            )),
            role: classify_role(player.ppg, rpg, apg, usage),
            primary_scorer: scoring_share >= PRIMARY_SCORER_SHARE,
            secondary_scorer: (SECONDARY_SCORER_SHARE..PRIMARY_SCORER_SHARE)
                .contains(&scoring_share),
        },
        ball_handling: BallHandling {
            apg: round1(apg),
            ast_to_ratio: round2(safe_div(p.asst as f64, p.to as f64)),
            total_assists: p.asst,
            total_turnovers: p.to,
            tpg: round1(p.to as f64 / g),
        },
        rebounding: Rebounding {
            rpg: round1(rpg),
            oreb: p.oreb,
            dreb: p.dreb,
            reb_share: round1(pct(p.reb as f64, team.totals.reb as f64)),
        },
        defense_activity: DefenseActivity {
            spg: round1(p.stl as f64 / g),
            bpg: round1(p.blk as f64 / g),
            total_stl: p.stl,
            total_blk: p.blk,
            stocks_per_game: round1((p.stl + p.blk) as f64 / g),
        },
        discipline: PlayerDiscipline {
            fpg: round1(p.fouls as f64 / g),
            total_fouls: p.fouls,
        },
        consistency: consistency(log, games),
        clutch_performance: clutch(log, player.ppg, options.clutch_margin),
        matchup_performance: matchup(log, player.ppg, options.strong_opponent_score),
        impact: Impact {
            plus_minus: player.plus_minus,
            pm_per_game: round1(player.plus_minus as f64 / g),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GameResult, Location, PlayerBoxScore};

    #[test]
    fn primary_scorer_boundary_is_inclusive() {
        assert_eq!(classify_role(20.0, 3.0, 2.0, 25.0), PlayerRole::PrimaryScorer);
    }

    #[test]
    fn just_below_primary_falls_through() {
        assert_eq!(classify_role(19.9, 3.0, 2.0, 25.0), PlayerRole::SecondaryScorer);
        // usage below 20 skips both scorer rules; ppg ≥ 12 lands on Shooter.
        assert_eq!(classify_role(19.9, 3.0, 2.0, 19.9), PlayerRole::Shooter);
    }

    #[test]
    fn playmaker_checked_before_rebounder() {
        assert_eq!(classify_role(10.0, 9.0, 4.0, 15.0), PlayerRole::Playmaker);
        assert_eq!(classify_role(10.0, 9.0, 4.0, 14.9), PlayerRole::Rebounder);
    }

    #[test]
    fn role_player_and_all_around() {
        assert_eq!(classify_role(7.9, 4.9, 2.9, 5.0), PlayerRole::RolePlayer);
        assert_eq!(classify_role(8.0, 4.0, 2.0, 5.0), PlayerRole::AllAround);
        assert_eq!(classify_role(5.5, 5.5, 1.0, 15.7), PlayerRole::AllAround);
    }

    #[test]
    fn grades_follow_rating_bands() {
        assert_eq!(EfficiencyGrade::from_rating(20.0), EfficiencyGrade::A);
        assert_eq!(EfficiencyGrade::from_rating(16.3), EfficiencyGrade::B);
        assert_eq!(EfficiencyGrade::from_rating(10.0), EfficiencyGrade::C);
        assert_eq!(EfficiencyGrade::from_rating(-3.0), EfficiencyGrade::D);
    }

    #[test]
    fn efficiency_rating_subtracts_misses_and_turnovers() {
        let line = StatLine {
            fg: 18,
            fga: 34,
            ft: 10,
            fta: 12,
            reb: 16,
            asst: 7,
            stl: 3,
            to: 11,
            ..StatLine::default()
        };
        assert!((efficiency_rating(52, &line, 3) - 49.0 / 3.0).abs() < 1e-9);
        assert_eq!(efficiency_rating(52, &line, 0), 0.0);
    }

    fn log_entry(team_score: u32, opp_score: u32, points: u32, fg: u32, fga: u32) -> GameLogEntry {
        GameLogEntry {
            game_id: 1,
            date: "2024-12-03".to_string(),
            opponent: "Ridgeview".to_string(),
            location: Location::Home,
            result: if team_score > opp_score {
                GameResult::Win
            } else {
                GameResult::Loss
            },
            team_score,
            opp_score,
            stats: PlayerBoxScore {
                name: "J Carter".to_string(),
                number: Some(4),
                points,
                plus_minus: 0,
                line: StatLine {
                    fg,
                    fga,
                    ..StatLine::default()
                },
            },
        }
    }

    #[test]
    fn clutch_margin_is_inclusive() {
        let log = vec![
            log_entry(50, 40, 12, 5, 10),
            log_entry(51, 40, 30, 12, 20),
            log_entry(38, 40, 8, 3, 9),
        ];
        let c = clutch(&log, 10.0, 10);
        assert_eq!(c.clutch_games, 2);
        assert_eq!(c.clutch_ppg, 10.0);
        assert_eq!(c.clutch_fg_pct, 42.1);
        assert_eq!(c.clutch_factor, 1.0);
    }

    #[test]
    fn no_close_games_zeroes_clutch() {
        let c = clutch(&[log_entry(60, 40, 18, 7, 12)], 18.0, 10);
        assert_eq!(c.clutch_games, 0);
        assert_eq!(c.clutch_ppg, 0.0);
        assert_eq!(c.clutch_fg_pct, 0.0);
        assert_eq!(c.clutch_factor, 0.0);

        assert_eq!(clutch(&[], 0.0, 10).clutch_games, 0);
    }

    #[test]
    fn consistency_score_goes_negative_for_streaky_scorers() {
        let log = vec![log_entry(50, 40, 0, 0, 5), log_entry(50, 40, 30, 10, 20)];
        let c = consistency(&log, 2);
        assert_eq!(c.pts_variance, 450.0);
        assert_eq!(c.consistency_score, -350.0);
        assert_eq!(c.fg_pct_variance, 1250.0);
        assert_eq!(c.games_played, 2);

        let steady = vec![log_entry(50, 40, 10, 4, 8), log_entry(50, 40, 12, 5, 9)];
        assert_eq!(consistency(&steady, 2).consistency_score, 98.0);
    }

    #[test]
    fn role_serializes_as_label() {
        let json = serde_json::to_string(&PlayerRole::SecondaryScorer).unwrap();
        assert_eq!(json, "\"Secondary Scorer\"");
        assert_eq!(PlayerRole::AllAround.to_string(), "All-Around");
    }
}
