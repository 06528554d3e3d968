// Integration tests for the season statistics engine.
//
// These load the three-game fixture season through the public API and check
// the derived numbers end-to-end: dataset loading and validation, team and
// player metrics, win/loss patterns, insights, volatility, leaderboards, and
// dataset reload through the shared store.

use std::path::{Path, PathBuf};

use hoopstats_core::analytics::player::{EfficiencyGrade, PlayerRole};
use hoopstats_core::analytics::{EngineOptions, StatsEngine};
use hoopstats_core::cache::{DatasetStore, ReportCache};
use hoopstats_core::dataset::{self, aggregate_player, aggregate_team, DatasetError};
use hoopstats_core::model::{GameResult, Location, SeasonDataset};

// ===========================================================================
// Test helpers
// ===========================================================================

/// Fixture directory path (relative to the crate root, which is the cwd for
/// `cargo test`).
const FIXTURES: &str = "tests/fixtures";

fn fixture_path(name: &str) -> PathBuf {
    Path::new(FIXTURES).join(name)
}

fn season() -> SeasonDataset {
    dataset::load_dataset(&fixture_path("season.json")).expect("fixture season should load")
}

/// Scratch file under the system temp dir, unique per test.
fn scratch_file(test: &str, name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hoopstats-{}-{}", test, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

// ===========================================================================
// Dataset loading
// ===========================================================================

#[test]
fn fixture_loads_games_in_id_order() {
    let ds = season();
    assert_eq!(ds.team, "Valley Central");
    assert_eq!(ds.season, "2024-25");
    let ids: Vec<u32> = ds.games.iter().map(|g| g.game_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(ds.games[0].location, Location::Home);
    assert_eq!(ds.games[2].result(), GameResult::Loss);
    assert_eq!(ds.games[0].player_stats[0].number, Some(4));
}

#[test]
fn nested_and_flat_logs_normalize_alike() {
    let ds = season();
    let carter = ds.game_log("J Carter");
    assert_eq!(carter.len(), 3);
    assert_eq!(carter[1].stats.points, 23);
    assert_eq!(carter[1].stats.line.fg, 8);
    assert_eq!(carter[1].opp_score, 30);

    // Flat entries arrive out of order and are sorted by game id.
    let nguyen = ds.game_log("T Nguyen");
    assert_eq!(nguyen.len(), 2);
    assert_eq!(nguyen[0].game_id, 1);
    assert_eq!(nguyen[1].game_id, 2);
    assert_eq!(nguyen[1].stats.line.fta, 2);
    assert_eq!(nguyen[1].stats.name, "T Nguyen");
    assert_eq!(nguyen[1].opponent, "Lakeside");
}

#[test]
fn stored_season_totals_match_game_sums() {
    let ds = season();
    let summed = aggregate_team(&ds.games);
    assert_eq!(summed.totals, ds.season_team_stats.totals);
    assert_eq!(summed.win, ds.season_team_stats.win);
    assert_eq!(summed.loss, ds.season_team_stats.loss);
    assert_eq!(summed.ppg, ds.season_team_stats.ppg);

    for (name, stored) in &ds.season_player_stats {
        let summed = aggregate_player(name, ds.game_log(name));
        assert_eq!(summed.totals, stored.totals, "totals for {name}");
        assert_eq!(summed.points, stored.points, "points for {name}");
        assert_eq!(summed.games, stored.games, "games for {name}");
        assert_eq!(summed.plus_minus, stored.plus_minus, "plus/minus for {name}");
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = dataset::load_dataset(&fixture_path("no_such_season.json")).unwrap_err();
    assert!(matches!(err, DatasetError::Io { .. }));
}

#[test]
fn game_log_for_unknown_game_is_rejected() {
    let json = br#"{"games": [{"gameId": 1, "location": "Home", "vc_score": 30, "opp_score": 20}],
        "player_game_logs": {"A": [{"gameId": 9, "pts": 4}]}}"#;
    let err = dataset::parse_dataset(json, "inline").unwrap_err();
    assert!(err.to_string().contains("references unknown game 9"), "{err}");
}

#[test]
fn minimal_file_derives_everything_else() {
    let json = br#"{"games": [
        {"gameId": 2, "location": "away", "vc_score": 40, "opp_score": 42,
         "team_stats": {"fg": 15, "fga": 40, "fg3": 4, "fg3a": 12, "ft": 6, "fta": 9, "reb": 20, "asst": 8, "to": 11},
         "player_stats": [{"name": "A", "fg_made": 6, "fg_att": 14, "ft_made": 2, "ft_att": 2}]},
        {"gameId": 1, "location": "home", "vc_score": 50, "opp_score": 41,
         "team_stats": {"fg": 20, "fga": 41, "fg3": 5, "fg3a": 14, "ft": 5, "fta": 7, "reb": 25, "asst": 12, "to": 9},
         "player_stats": [{"name": "A", "fg_made": 7, "fg_att": 12, "pts": 17}]}
    ]}"#;
    let ds = dataset::parse_dataset(json, "inline").unwrap();
    assert_eq!(ds.games[0].game_id, 1);
    assert_eq!(ds.season_team_stats.win, 1);
    assert_eq!(ds.season_team_stats.loss, 1);
    assert_eq!(ds.season_team_stats.ppg, 45.0);
    assert_eq!(ds.season_team_stats.totals.reb, 45);

    let a = ds.player("A").unwrap();
    assert_eq!(a.games, 2);
    // 17 stored + 14 from shooting counts (6·2 + 2).
    assert_eq!(a.points, 31);
    assert_eq!(a.ppg, 15.5);
}

// ===========================================================================
// Team metrics
// ===========================================================================

#[test]
fn team_advanced_matches_hand_computation() {
    let ds = season();
    let options = EngineOptions::default();
    let team = StatsEngine::new(&ds, &options).team_advanced().unwrap();

    let s = &team.scoring_efficiency;
    assert_eq!(team.games_played, 3);
    assert_eq!(s.points, 93.0);
    assert_eq!(s.ppp, 1.042);
    assert_eq!(s.efg_pct, 56.7);
    assert_eq!(s.ts_pct, 61.0);
    assert_eq!(s.fg_pct, 49.3);
    assert_eq!(s.fg2_made, 23);
    assert_eq!(s.fg2_att, 40);
    assert_eq!(s.fg2_pct, 57.5);
    assert_eq!(s.fg3_pct, 37.0);
    assert_eq!(s.ft_pct, 81.0);
    assert_eq!(s.pts_per_shot, 1.22);
    assert_eq!(s.pts_per_fga, 1.39);
    assert_eq!(s.pts_per_fta, 4.43);

    let mix = &team.shot_mix;
    assert_eq!(mix.fg3_attempt_rate, 40.3);
    assert_eq!(mix.ft_rate, 31.3);
    assert_eq!(mix.inside_scoring_reliance, 59.7);
    assert_eq!(mix.shot_balance.two_pt_share, 49.5);
    assert_eq!(mix.shot_balance.three_pt_share, 32.3);
    assert_eq!(mix.shot_balance.ft_share, 18.3);

    let poss = &team.possession_control;
    assert_eq!(poss.est_possessions, 89.2);
    assert_eq!(poss.to_per_100, 28.0);
    assert_eq!(poss.to_per_poss, 0.28);
    assert_eq!(poss.ast_to_ratio, 0.92);
    assert_eq!(poss.reb_per_poss, 0.471);
    assert_eq!(poss.oreb_rate_estimate, 14.3);
    assert_eq!(poss.dreb_rate_estimate, 35.7);

    assert_eq!(team.ball_movement.ast_per_fg, 0.70);
    assert_eq!(team.ball_movement.assisted_scoring_rate, 69.7);
    assert_eq!(team.ball_movement.isolation_reliance, 30.3);
    assert_eq!(team.defense.spg, 2.0);
    assert_eq!(team.defense.bpg, 1.0);
    assert_eq!(team.defense.stl_blk_per_poss, 0.101);
    assert_eq!(team.discipline.fpg, 12.0);
    assert_eq!(team.discipline.fta_per_game, 7.0);
}

#[test]
fn shooting_percentages_stay_in_range() {
    let ds = season();
    let options = EngineOptions::default();
    let engine = StatsEngine::new(&ds, &options);
    for name in ds.season_player_stats.keys() {
        let p = engine.player_advanced(name).unwrap();
        for v in [
            p.scoring_efficiency.fg_pct,
            p.scoring_efficiency.fg2_pct,
            p.scoring_efficiency.fg3_pct,
            p.scoring_efficiency.ft_pct,
            p.scoring_efficiency.efg_pct,
        ] {
            assert!((0.0..=100.0).contains(&v), "{name}: {v}");
        }
    }
    for game in &ds.games {
        let g = engine.game_advanced(game.game_id).unwrap();
        assert!((0.0..=100.0).contains(&g.efficiency.fg_pct));
        assert!((0.0..=100.0).contains(&g.ball_movement.ast_pct));
    }
}

#[test]
fn game_breakdown_for_home_win() {
    let ds = season();
    let options = EngineOptions::default();
    let g = StatsEngine::new(&ds, &options).game_advanced(1).unwrap();
    assert_eq!(g.score, "28-20");
    assert_eq!(g.result, GameResult::Win);
    assert_eq!(g.opponent, "Ridgeview");
    assert_eq!(g.ball_movement.assists, 8);
    assert_eq!(g.ball_movement.ast_pct, 80.0);
    assert!(StatsEngine::new(&ds, &options).game_advanced(99).is_none());
}

// ===========================================================================
// Player metrics
// ===========================================================================

#[test]
fn lead_scorer_profile() {
    let ds = season();
    let options = EngineOptions::default();
    let p = StatsEngine::new(&ds, &options)
        .player_advanced("J Carter")
        .unwrap();

    assert_eq!(p.games, 3);
    assert_eq!(p.scoring_efficiency.ppg, 17.3);
    assert_eq!(p.scoring_efficiency.efg_pct, 61.8);
    assert_eq!(p.scoring_efficiency.ts_pct, 66.2);
    assert_eq!(p.scoring_efficiency.efficiency_rating, 16.3);
    assert_eq!(p.scoring_efficiency.efficiency_grade, EfficiencyGrade::B);

    assert_eq!(p.usage_role.usage_proxy, 49.7);
    assert_eq!(p.usage_role.scoring_share, 55.9);
    assert_eq!(p.usage_role.role, PlayerRole::SecondaryScorer);
    assert!(p.usage_role.primary_scorer);
    assert!(!p.usage_role.secondary_scorer);

    assert_eq!(p.consistency.pts_variance, 24.3);
    assert_eq!(p.consistency.consistency_score, 75.7);
    assert_eq!(p.consistency.games_played, 3);

    // Only the 28-20 game is within the clutch margin.
    assert_eq!(p.clutch_performance.clutch_games, 1);
    assert_eq!(p.clutch_performance.clutch_ppg, 15.0);
    assert_eq!(p.clutch_performance.clutch_fg_pct, 55.6);
    assert_eq!(p.clutch_performance.clutch_factor, 0.87);

    // No opponent reached the strong-score line.
    assert_eq!(p.matchup_performance.strong_opponent_games, 0);
    assert_eq!(p.matchup_performance.vs_strong_teams_ppg, 17.3);
    assert_eq!(p.matchup_performance.strong_team_factor, 1.0);

    assert_eq!(p.impact.plus_minus, 8);
    assert_eq!(p.impact.pm_per_game, 2.7);
}

#[test]
fn roles_across_the_roster() {
    let ds = season();
    let options = EngineOptions::default();
    let engine = StatsEngine::new(&ds, &options);
    let lopez = engine.player_advanced("M Lopez").unwrap();
    assert_eq!(lopez.usage_role.usage_proxy, 34.7);
    assert_eq!(lopez.usage_role.role, PlayerRole::Playmaker);

    let nguyen = engine.player_advanced("T Nguyen").unwrap();
    assert_eq!(nguyen.usage_role.usage_proxy, 15.7);
    assert_eq!(nguyen.usage_role.role, PlayerRole::AllAround);
    assert_eq!(nguyen.consistency.games_played, 2);

    assert!(engine.player_advanced("Nobody").is_none());
}

#[test]
fn lowering_strong_opponent_line_changes_matchups() {
    let ds = season();
    let options = EngineOptions {
        strong_opponent_score: 30,
        ..EngineOptions::default()
    };
    let p = StatsEngine::new(&ds, &options)
        .player_advanced("J Carter")
        .unwrap();
    // Games 2 (30 allowed) and 3 (35 allowed): (23 + 14) / 2.
    assert_eq!(p.matchup_performance.strong_opponent_games, 2);
    assert_eq!(p.matchup_performance.vs_strong_teams_ppg, 18.5);
}

#[test]
fn compare_skips_unknown_names() {
    let ds = season();
    let options = EngineOptions::default();
    let names = vec!["J Carter".to_string(), "Ghost".to_string(), "M Lopez".to_string()];
    let compared = StatsEngine::new(&ds, &options).compare(&names);
    assert_eq!(compared.len(), 2);
    assert_eq!(compared[0].name, "J Carter");
    assert_eq!(compared[0].basic_stats.tpg, 3.7);
    assert_eq!(compared[1].role, PlayerRole::Playmaker);
}

// ===========================================================================
// Patterns, insights, volatility, leaders
// ===========================================================================

#[test]
fn win_loss_patterns_for_fixture() {
    let ds = season();
    let options = EngineOptions::default();
    let p = StatsEngine::new(&ds, &options).patterns();
    assert_eq!(p.total_wins, 2);
    assert_eq!(p.total_losses, 1);

    let w = &p.win_conditions;
    assert_eq!(w.games, 2);
    assert_eq!(w.min_fg_pct, 50.0);
    assert_eq!(w.avg_fg_pct, 55.0);
    assert_eq!(w.max_to, 8);
    assert_eq!(w.avg_to, 6.5);
    assert_eq!(w.min_ast, 8);
    assert_eq!(w.avg_ast, 9.0);
    assert_eq!(w.min_reb, 15);

    assert_eq!(p.loss_conditions.avg_fg_pct, 36.4);
    assert_eq!(p.loss_conditions.avg_to, 12.0);

    assert_eq!(p.threshold_records.to_at_or_below.to_string(), "2-1");
    assert_eq!(p.threshold_records.fg_pct_at_or_above.to_string(), "2-0");
}

#[test]
fn insights_for_fixture() {
    let ds = season();
    let options = EngineOptions::default();
    let insights = StatsEngine::new(&ds, &options).insights();
    assert_eq!(
        insights,
        vec![
            "Team is 2-0 when turnovers ≤ 8".to_string(),
            "Team is undefeated when FG% ≥ 50.0%".to_string(),
            "In losses, team averages 12.0 TO vs 6.5 in wins".to_string(),
            "Record when TO ≤ 13: 2-1".to_string(),
            "Record when FG% ≥ 44%: 2-0".to_string(),
        ]
    );
}

#[test]
fn volatility_for_fixture() {
    let ds = season();
    let options = EngineOptions::default();
    let v = StatsEngine::new(&ds, &options).volatility();
    assert_eq!(v.team.points.variance, 117.0);
    assert_eq!(v.team.points.std_dev, 10.8);
    assert_eq!(v.team.points.min, 22.0);
    assert_eq!(v.team.points.max, 43.0);
    assert_eq!(v.team.turnovers.variance, 12.3);
    assert_eq!(v.team.turnovers.std_dev, 3.5);
    assert_eq!(v.team.fg_pct.variance, 140.8);
    assert_eq!(v.team.fg_pct.std_dev, 11.9);

    let names: Vec<&str> = v.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["J Carter", "M Lopez", "T Nguyen"]);
    assert_eq!(v.players[0].points.variance, 24.3);
}

#[test]
fn leaderboards_break_ties_by_name() {
    let ds = season();
    let options = EngineOptions::default();
    let boards = StatsEngine::new(&ds, &options).leaderboards();
    let pts: Vec<&str> = boards.pts.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(pts, vec!["J Carter", "M Lopez", "T Nguyen"]);

    assert_eq!(boards.fg_pct[0].value, 52.9);
    assert_eq!(boards.fg_pct[1].name, "M Lopez");
    assert_eq!(boards.fg_pct[1].value, 45.5);
    assert_eq!(boards.fg_pct[2].name, "T Nguyen");
    assert_eq!(boards.fg_pct[2].value, 45.5);
}

#[test]
fn trends_follow_game_order() {
    let ds = season();
    let options = EngineOptions::default();
    let engine = StatsEngine::new(&ds, &options);
    let team = engine.team_trends();
    assert_eq!(team.len(), 3);
    assert_eq!(team.vc_score, vec![28, 43, 22]);
    assert_eq!(team.to, vec![5, 8, 12]);

    let nguyen = engine.player_trends("T Nguyen").unwrap();
    assert_eq!(nguyen.games, vec![1, 2]);
    assert_eq!(nguyen.pts, vec![4, 7]);
    assert!(engine.player_trends("Nobody").is_none());
}

#[test]
fn full_report_covers_every_player_and_game() {
    let ds = season();
    let options = EngineOptions::default();
    let report = StatsEngine::new(&ds, &options).report();
    assert_eq!(report.team, "Valley Central");
    assert_eq!(report.player_advanced.len(), 3);
    assert_eq!(report.game_advanced.len(), 3);
    assert_eq!(report.insights.len(), 5);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(
        json["team_advanced"]["shot_mix"]["shot_balance"]["2pt_share"],
        serde_json::json!(49.5)
    );
    assert_eq!(
        json["player_advanced"]["M Lopez"]["usage_role"]["role"],
        serde_json::json!("Playmaker")
    );
}

// ===========================================================================
// Store and report cache
// ===========================================================================

#[test]
fn store_reload_swaps_dataset_and_cache_follows() {
    let stats = scratch_file("reload", "season.json");
    std::fs::copy(fixture_path("season.json"), &stats).unwrap();

    let store = DatasetStore::open(&stats, None).unwrap();
    let cache = ReportCache::new();
    let options = EngineOptions::default();

    let before = store.current();
    let first = cache.get_or_compute(&before, &options);
    assert_eq!(first.patterns.total_wins, 2);

    let smaller = br#"{"games": [{"gameId": 1, "location": "Home", "vc_score": 30, "opp_score": 31,
        "team_stats": {"fg": 12, "fga": 30, "to": 14}}]}"#;
    std::fs::write(&stats, smaller).unwrap();
    let after = store.reload().unwrap();
    assert_ne!(before.fingerprint, after.fingerprint);
    assert_eq!(store.current().dataset.games.len(), 1);

    // The old snapshot is untouched.
    assert_eq!(before.dataset.games.len(), 3);

    let second = cache.get_or_compute(&store.current(), &options);
    assert_eq!(second.patterns.total_losses, 1);
    assert!(cache.is_cached_for(&after.fingerprint));
}

#[test]
fn failed_reload_keeps_previous_dataset() {
    let stats = scratch_file("bad-reload", "season.json");
    std::fs::copy(fixture_path("season.json"), &stats).unwrap();
    let store = DatasetStore::open(&stats, None).unwrap();
    let fingerprint = store.current().fingerprint.clone();

    std::fs::write(&stats, b"{ not json").unwrap();
    let err = store.reload().unwrap_err();
    assert!(matches!(err, DatasetError::Json { .. }));
    assert_eq!(store.current().fingerprint, fingerprint);
    assert_eq!(store.current().dataset.games.len(), 3);
}

#[test]
fn store_picks_up_roster() {
    let stats = scratch_file("roster", "season.json");
    let roster = scratch_file("roster", "roster.json");
    std::fs::copy(fixture_path("season.json"), &stats).unwrap();
    std::fs::write(
        &roster,
        br#"{"roster": [{"name": "Jordan Carter", "number": 4, "grade": "Sr"}]}"#,
    )
    .unwrap();

    let store = DatasetStore::open(&stats, Some(&roster)).unwrap();
    let current = store.current();
    assert_eq!(current.roster.first_name("J Carter"), "Jordan");
    assert_eq!(current.roster.first_name("M Lopez"), "M");
}
