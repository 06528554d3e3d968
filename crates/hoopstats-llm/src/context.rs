// Plain-text season summary handed to the LLM as grounding data.

use hoopstats_core::analytics::stats::safe_div;
use hoopstats_core::model::{SeasonDataset, SeasonPlayerStats};

/// Scorers listed per game line.
const TOP_SCORERS_PER_GAME: usize = 3;

fn is_excluded(name: &str, excluded: &[String]) -> bool {
    excluded.iter().any(|e| e.trim().eq_ignore_ascii_case(name.trim()))
}

/// Season players ordered by ppg, highest first, then by name.
pub(crate) fn players_by_ppg<'a>(
    dataset: &'a SeasonDataset,
    excluded: &[String],
) -> Vec<&'a SeasonPlayerStats> {
    let mut players: Vec<&SeasonPlayerStats> = dataset
        .season_player_stats
        .iter()
        .filter(|(key, _)| !is_excluded(key, excluded))
        .map(|(_, p)| p)
        .collect();
    players.sort_by(|a, b| b.ppg.total_cmp(&a.ppg).then_with(|| a.name.cmp(&b.name)));
    players
}

/// Render the season as plain text: record, team averages, one line per game
/// with its top scorers, and one entry per player. Players named in
/// `excluded` are left out everywhere.
pub fn build_stats_context(dataset: &SeasonDataset, excluded: &[String]) -> String {
    let team = &dataset.season_team_stats;
    let games = team.total_games();
    if games == 0 && dataset.games.is_empty() {
        return "No season statistics available".to_string();
    }
    let g = games as f64;
    let t = &team.totals;

    let mut out = String::with_capacity(4096);
    let title = match (dataset.team.is_empty(), dataset.season.is_empty()) {
        (false, false) => format!("{} - {} Season Stats", dataset.team, dataset.season),
        (false, true) => format!("{} Season Stats", dataset.team),
        _ => "Season Stats".to_string(),
    };
    out.push_str(&format!("{title}\n\n"));
    out.push_str(&format!("TEAM RECORD: {}-{}\n", team.win, team.loss));
    out.push_str(&format!(
        "Win Percentage: {:.1}%\n\n",
        safe_div(team.win as f64, g) * 100.0
    ));

    out.push_str("TEAM SEASON AVERAGES:\n");
    out.push_str(&format!("- Points Per Game: {:.1}\n", team.ppg));
    out.push_str(&format!("- Rebounds Per Game: {:.1}\n", team.rpg));
    out.push_str(&format!("- Assists Per Game: {:.1}\n", team.apg));
    out.push_str(&format!("- Turnovers Per Game: {:.1}\n", safe_div(t.to as f64, g)));
    out.push_str(&format!("- Steals Per Game: {:.1}\n", safe_div(t.stl as f64, g)));
    out.push_str(&format!("- Blocks Per Game: {:.1}\n", safe_div(t.blk as f64, g)));
    out.push_str(&format!("- Field Goal %: {:.1}%\n", t.fg_pct()));
    out.push_str(&format!("- Three Point %: {:.1}%\n", t.fg3_pct()));
    out.push_str(&format!("- Free Throw %: {:.1}%\n", t.ft_pct()));

    out.push_str(&format!("\nGAME-BY-GAME RESULTS ({} games):\n", dataset.games.len()));
    for game in &dataset.games {
        let mut scorers: Vec<_> = game
            .player_stats
            .iter()
            .filter(|p| !is_excluded(&p.name, excluded))
            .collect();
        scorers.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
        let top = scorers
            .iter()
            .take(TOP_SCORERS_PER_GAME)
            .map(|p| format!("{} {}pts", p.name, p.points))
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "\nGame {} - {} vs {}: {} {}-{}\n",
            game.game_id,
            game.date,
            game.opponent,
            game.result(),
            game.vc_score,
            game.opp_score
        ));
        out.push_str(&format!(
            "  FG: {:.1}%, AST: {}, TO: {}\n",
            game.team_stats.fg_pct(),
            game.team_stats.asst,
            game.team_stats.to
        ));
        out.push_str(&format!("  Top: {top}\n"));
    }

    out.push_str("\nPLAYER SEASON STATISTICS:\n");
    for p in players_by_ppg(dataset, excluded) {
        let games = p.games.max(1) as f64;
        out.push_str(&format!(
            "\n{}: {}GP, {:.1}PPG, {:.1}RPG, {:.1}APG, {:.1}TPG\n",
            p.name,
            p.games,
            p.ppg,
            p.rpg,
            p.apg,
            p.totals.to as f64 / games
        ));
        out.push_str(&format!(
            "  Shooting: {:.1}%FG, {:.1}%3P, {:.1}%FT\n",
            p.totals.fg_pct(),
            p.totals.fg3_pct(),
            p.totals.ft_pct()
        ));
    }
    out
}
