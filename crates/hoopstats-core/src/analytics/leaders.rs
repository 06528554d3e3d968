// Season leaderboards by counting totals and shooting percentages.

use serde::Serialize;

use crate::analytics::stats::round1;
use crate::model::{SeasonDataset, SeasonPlayerStats};

/// Default leaderboard length.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderEntry {
    pub name: String,
    pub games: u32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Leaderboards {
    pub pts: Vec<LeaderEntry>,
    pub reb: Vec<LeaderEntry>,
    pub asst: Vec<LeaderEntry>,
    pub stl: Vec<LeaderEntry>,
    pub blk: Vec<LeaderEntry>,
    pub fg_pct: Vec<LeaderEntry>,
    pub fg3_pct: Vec<LeaderEntry>,
    pub ft_pct: Vec<LeaderEntry>,
}

/// Rank the players that pass `eligible` by `value`, highest first, ties
/// broken by name.
fn rank<F, P>(dataset: &SeasonDataset, size: usize, eligible: P, value: F) -> Vec<LeaderEntry>
where
    F: Fn(&SeasonPlayerStats) -> f64,
    P: Fn(&SeasonPlayerStats) -> bool,
{
    let mut entries: Vec<LeaderEntry> = dataset
        .season_player_stats
        .iter()
        .filter(|(_, p)| eligible(*p))
        .map(|(key, p)| LeaderEntry {
            name: key.clone(),
            games: p.games,
            value: value(p),
        })
        .collect();
    entries.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    entries.truncate(size);
    entries
}

/// Top `size` players in each category. Percentage boards only include
/// players with at least one attempt and are recomputed from counts.
pub fn compute_leaderboards(dataset: &SeasonDataset, size: usize) -> Leaderboards {
    let any = |_: &SeasonPlayerStats| true;
    Leaderboards {
        pts: rank(dataset, size, any, |p| p.points as f64),
        reb: rank(dataset, size, any, |p| p.totals.reb as f64),
        asst: rank(dataset, size, any, |p| p.totals.asst as f64),
        stl: rank(dataset, size, any, |p| p.totals.stl as f64),
        blk: rank(dataset, size, any, |p| p.totals.blk as f64),
        fg_pct: rank(
            dataset,
            size,
            |p| p.totals.fga > 0,
            |p| round1(p.totals.fg_pct()),
        ),
        fg3_pct: rank(
            dataset,
            size,
            |p| p.totals.fg3a > 0,
            |p| round1(p.totals.fg3_pct()),
        ),
        ft_pct: rank(
            dataset,
            size,
            |p| p.totals.fta > 0,
            |p| round1(p.totals.ft_pct()),
        ),
    }
}
