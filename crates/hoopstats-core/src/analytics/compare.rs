// Side-by-side player comparison.

use serde::Serialize;

use crate::analytics::player::{compute_player_advanced, EfficiencyGrade, PlayerRole};
use crate::analytics::stats::round1;
use crate::analytics::EngineOptions;
use crate::model::SeasonDataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicStats {
    pub ppg: f64,
    pub rpg: f64,
    pub apg: f64,
    pub tpg: f64,
    pub fg_pct: f64,
    pub fg3_pct: f64,
    pub ft_pct: f64,
    pub spg: f64,
    pub bpg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparedPlayer {
    pub name: String,
    pub basic_stats: BasicStats,
    pub role: PlayerRole,
    pub efficiency_grade: EfficiencyGrade,
}

/// Compare the named players. Unknown names and players without games are
/// skipped; the caller decides whether the remainder is enough to compare.
pub fn compare_players(
    dataset: &SeasonDataset,
    names: &[String],
    options: &EngineOptions,
) -> Vec<ComparedPlayer> {
    names
        .iter()
        .filter_map(|name| {
            let name = name.trim();
            let stats = dataset.player(name)?;
            let advanced = compute_player_advanced(dataset, name, options)?;
            let g = stats.games as f64;
            let t = &stats.totals;
            Some(ComparedPlayer {
                name: name.to_string(),
                basic_stats: BasicStats {
                    ppg: stats.ppg,
                    rpg: stats.rpg,
                    apg: stats.apg,
                    tpg: round1(t.to as f64 / g),
                    fg_pct: round1(t.fg_pct()),
                    fg3_pct: round1(t.fg3_pct()),
                    ft_pct: round1(t.ft_pct()),
                    spg: round1(t.stl as f64 / g),
                    bpg: round1(t.blk as f64 / g),
                },
                role: advanced.usage_role.role,
                efficiency_grade: advanced.scoring_efficiency.efficiency_grade,
            })
        })
        .collect()
}
