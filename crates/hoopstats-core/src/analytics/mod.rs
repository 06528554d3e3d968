// Statistics derivation engine. Every computation is a pure function of the
// borrowed dataset and options.

pub mod compare;
pub mod game;
pub mod insights;
pub mod leaders;
pub mod patterns;
pub mod player;
pub mod stats;
pub mod team;
pub mod trends;
pub mod volatility;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::SeasonDataset;

use self::compare::ComparedPlayer;
use self::game::GameAdvancedStats;
use self::leaders::{Leaderboards, LEADERBOARD_SIZE};
use self::patterns::{PatternThresholds, WinLossPatterns};
use self::player::PlayerAdvancedStats;
use self::team::TeamAdvancedStats;
use self::trends::{PlayerTrends, TeamTrends};
use self::volatility::{VolatilityReport, TOP_SCORERS_COUNT};

/// Games decided by this many points or fewer count as clutch.
pub const CLUTCH_MARGIN: u32 = 10;

/// Opponents scoring at least this many points count as strong.
pub const STRONG_OPPONENT_SCORE: u32 = 70;

/// Tunable knobs. `Default` reproduces the named constants.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
    pub thresholds: PatternThresholds,
    pub clutch_margin: u32,
    pub strong_opponent_score: u32,
    pub top_scorers_count: usize,
    pub leaderboard_size: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            thresholds: PatternThresholds::default(),
            clutch_margin: CLUTCH_MARGIN,
            strong_opponent_score: STRONG_OPPONENT_SCORE,
            top_scorers_count: TOP_SCORERS_COUNT,
            leaderboard_size: LEADERBOARD_SIZE,
        }
    }
}

/// Everything the engine derives for a season in one value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonReport {
    pub team: String,
    pub season: String,
    pub team_advanced: Option<TeamAdvancedStats>,
    pub player_advanced: BTreeMap<String, PlayerAdvancedStats>,
    pub game_advanced: Vec<GameAdvancedStats>,
    pub patterns: WinLossPatterns,
    pub volatility: VolatilityReport,
    pub insights: Vec<String>,
}

/// Facade over the per-area computations for one dataset.
#[derive(Debug, Clone, Copy)]
pub struct StatsEngine<'a> {
    dataset: &'a SeasonDataset,
    options: &'a EngineOptions,
}

impl<'a> StatsEngine<'a> {
    pub fn new(dataset: &'a SeasonDataset, options: &'a EngineOptions) -> Self {
        Self { dataset, options }
    }

    pub fn team_advanced(&self) -> Option<TeamAdvancedStats> {
        team::compute_team_advanced(&self.dataset.season_team_stats, &self.dataset.games)
    }

    pub fn player_advanced(&self, name: &str) -> Option<PlayerAdvancedStats> {
        player::compute_player_advanced(self.dataset, name, self.options)
    }

    pub fn game_advanced(&self, game_id: u32) -> Option<GameAdvancedStats> {
        game::compute_game_advanced(&self.dataset.games, game_id)
    }

    pub fn patterns(&self) -> WinLossPatterns {
        patterns::compute_win_loss_patterns(&self.dataset.games, &self.options.thresholds)
    }

    pub fn volatility(&self) -> VolatilityReport {
        volatility::compute_volatility(self.dataset, self.options.top_scorers_count)
    }

    pub fn insights(&self) -> Vec<String> {
        insights::generate_auto_insights(&self.patterns())
    }

    pub fn leaderboards(&self) -> Leaderboards {
        leaders::compute_leaderboards(self.dataset, self.options.leaderboard_size)
    }

    pub fn team_trends(&self) -> TeamTrends {
        trends::compute_team_trends(&self.dataset.games)
    }

    pub fn player_trends(&self, name: &str) -> Option<PlayerTrends> {
        trends::compute_player_trends(name, self.dataset.game_log(name))
    }

    pub fn compare(&self, names: &[String]) -> Vec<ComparedPlayer> {
        compare::compare_players(self.dataset, names, self.options)
    }

    /// Full season report. Players with zero games are left out.
    pub fn report(&self) -> SeasonReport {
        let patterns = self.patterns();
        let insights = insights::generate_auto_insights(&patterns);
        SeasonReport {
            team: self.dataset.team.clone(),
            season: self.dataset.season.clone(),
            team_advanced: self.team_advanced(),
            player_advanced: self
                .dataset
                .season_player_stats
                .keys()
                .filter_map(|name| Some((name.clone(), self.player_advanced(name)?)))
                .collect(),
            game_advanced: self.dataset.games.iter().map(game::game_advanced).collect(),
            patterns,
            volatility: self.volatility(),
            insights,
        }
    }
}
