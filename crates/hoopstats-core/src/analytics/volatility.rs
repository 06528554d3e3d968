// Game-to-game volatility for the team and its top scorers.

use serde::Serialize;

use crate::analytics::stats::{compute_dispersion, round1};
use crate::model::{SeasonDataset, SeasonPlayerStats};

/// Default number of scorers tracked.
pub const TOP_SCORERS_COUNT: usize = 5;

/// Rounded spread of one series. Variance and standard deviation are 0 with
/// fewer than two samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MetricSpread {
    pub variance: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl MetricSpread {
    pub fn of(values: &[f64]) -> Self {
        let d = compute_dispersion(values);
        Self {
            variance: round1(d.variance),
            std_dev: round1(d.std_dev),
            min: round1(d.min),
            max: round1(d.max),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamVolatility {
    pub points: MetricSpread,
    pub fg_pct: MetricSpread,
    pub turnovers: MetricSpread,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerVolatility {
    pub name: String,
    pub ppg: f64,
    pub games: u32,
    pub points: MetricSpread,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityReport {
    pub team: TeamVolatility,
    pub players: Vec<PlayerVolatility>,
}

/// Top `n` players by season ppg, ties broken by name.
pub fn top_scorers(dataset: &SeasonDataset, n: usize) -> Vec<(&str, &SeasonPlayerStats)> {
    let mut ranked: Vec<_> = dataset
        .season_player_stats
        .iter()
        .map(|(k, v)| (k.as_str(), v))
        .collect();
    ranked.sort_by(|(ka, a), (kb, b)| b.ppg.total_cmp(&a.ppg).then_with(|| ka.cmp(kb)));
    ranked.truncate(n);
    ranked
}

/// Team spread of points, FG% (games with attempts) and turnovers, plus the
/// points spread for each of the top `top_n` scorers that has a game log.
pub fn compute_volatility(dataset: &SeasonDataset, top_n: usize) -> VolatilityReport {
    let games = &dataset.games;
    let points: Vec<f64> = games.iter().map(|g| g.vc_score as f64).collect();
    let fg_pcts: Vec<f64> = games
        .iter()
        .filter(|g| g.team_stats.fga > 0)
        .map(|g| g.team_stats.fg_pct())
        .collect();
    let turnovers: Vec<f64> = games.iter().map(|g| g.team_stats.to as f64).collect();

    let mut players = Vec::new();
    for (key, stats) in top_scorers(dataset, top_n) {
        let log = dataset.game_log(key);
        if log.is_empty() {
            continue;
        }
        let series: Vec<f64> = log.iter().map(|e| e.stats.points as f64).collect();
        players.push(PlayerVolatility {
            name: key.to_string(),
            ppg: stats.ppg,
            games: log.len() as u32,
            points: MetricSpread::of(&series),
        });
    }

    VolatilityReport {
        team: TeamVolatility {
            points: MetricSpread::of(&points),
            fg_pct: MetricSpread::of(&fg_pcts),
            turnovers: MetricSpread::of(&turnovers),
        },
        players,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_sample_spread_is_zero() {
        let s = MetricSpread::of(&[31.0]);
        assert_eq!(s.variance, 0.0);
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.min, 31.0);
        assert_eq!(s.max, 31.0);
    }

    #[test]
    fn spread_rounds_to_one_decimal() {
        let s = MetricSpread::of(&[28.0, 43.0, 22.0]);
        assert_eq!(s.variance, 117.0);
        assert_eq!(s.std_dev, 10.8);
        assert_eq!(s.min, 22.0);
        assert_eq!(s.max, 43.0);
    }
}
