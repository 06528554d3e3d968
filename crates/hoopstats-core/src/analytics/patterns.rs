// Win/loss condition mining: descriptive stats split by outcome, plus
// threshold records.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::analytics::stats::{mean, round1};
use crate::model::Game;

/// Default turnover ceiling for the threshold record.
pub const TURNOVER_THRESHOLD: u32 = 13;

/// Default FG% floor for the threshold record.
pub const FG_PERCENTAGE_THRESHOLD: f64 = 44.0;

/// Thresholds for the two threshold records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternThresholds {
    pub turnovers: u32,
    pub fg_pct: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            turnovers: TURNOVER_THRESHOLD,
            fg_pct: FG_PERCENTAGE_THRESHOLD,
        }
    }
}

/// Win-loss record over a subset of games. Serializes as `"W-L"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThresholdRecord {
    pub wins: u32,
    pub losses: u32,
}

impl ThresholdRecord {
    fn tally<'a>(games: impl Iterator<Item = &'a Game>) -> Self {
        games.fold(Self::default(), |mut rec, g| {
            if g.result().is_win() {
                rec.wins += 1;
            } else {
                rec.losses += 1;
            }
            rec
        })
    }
}

impl fmt::Display for ThresholdRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wins, self.losses)
    }
}

impl Serialize for ThresholdRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Descriptive stats for one outcome partition. All zero when the partition
/// is empty. FG% figures only use games with at least one attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutcomeConditions {
    pub games: u32,
    pub min_fg_pct: f64,
    pub avg_fg_pct: f64,
    pub min_to: u32,
    pub max_to: u32,
    pub avg_to: f64,
    pub min_ast: u32,
    pub avg_ast: f64,
    pub min_reb: u32,
}

impl OutcomeConditions {
    fn from_games(games: &[&Game]) -> Self {
        if games.is_empty() {
            return Self::default();
        }
        let fg_pcts: Vec<f64> = games
            .iter()
            .filter(|g| g.team_stats.fga > 0)
            .map(|g| g.team_stats.fg_pct())
            .collect();
        let tos: Vec<u32> = games.iter().map(|g| g.team_stats.to).collect();
        let asts: Vec<u32> = games.iter().map(|g| g.team_stats.asst).collect();
        let as_f64 = |v: &[u32]| v.iter().map(|&x| x as f64).collect::<Vec<_>>();
        let min_fg = fg_pcts.iter().copied().fold(f64::INFINITY, f64::min);

        Self {
            games: games.len() as u32,
            min_fg_pct: if fg_pcts.is_empty() { 0.0 } else { round1(min_fg) },
            avg_fg_pct: round1(mean(&fg_pcts)),
            min_to: tos.iter().copied().min().unwrap_or(0),
            max_to: tos.iter().copied().max().unwrap_or(0),
            avg_to: round1(mean(&as_f64(&tos))),
            min_ast: asts.iter().copied().min().unwrap_or(0),
            avg_ast: round1(mean(&as_f64(&asts))),
            min_reb: games.iter().map(|g| g.team_stats.reb).min().unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdRecords {
    pub turnover_threshold: u32,
    pub to_at_or_below: ThresholdRecord,
    pub fg_pct_threshold: f64,
    pub fg_pct_at_or_above: ThresholdRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WinLossPatterns {
    pub win_conditions: OutcomeConditions,
    pub loss_conditions: OutcomeConditions,
    pub threshold_records: ThresholdRecords,
    pub total_wins: u32,
    pub total_losses: u32,
}

/// Partition games by score-derived result and mine each side.
///
/// The FG% threshold compares against unrounded FG%, and games with no field
/// goal attempts never meet it.
pub fn compute_win_loss_patterns(games: &[Game], thresholds: &PatternThresholds) -> WinLossPatterns {
    let (wins, losses): (Vec<&Game>, Vec<&Game>) =
        games.iter().partition(|g| g.result().is_win());

    let to_record = ThresholdRecord::tally(
        games
            .iter()
            .filter(|g| g.team_stats.to <= thresholds.turnovers),
    );
    let fg_record = ThresholdRecord::tally(
        games
            .iter()
            .filter(|g| g.team_stats.fga > 0 && g.team_stats.fg_pct() >= thresholds.fg_pct),
    );

    WinLossPatterns {
        win_conditions: OutcomeConditions::from_games(&wins),
        loss_conditions: OutcomeConditions::from_games(&losses),
        threshold_records: ThresholdRecords {
            turnover_threshold: thresholds.turnovers,
            to_at_or_below: to_record,
            fg_pct_threshold: thresholds.fg_pct,
            fg_pct_at_or_above: fg_record,
        },
        total_wins: wins.len() as u32,
        total_losses: losses.len() as u32,
    }
}
