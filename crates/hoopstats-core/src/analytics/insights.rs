// Auto-generated insight sentences. Pure formatting over mined patterns.

use crate::analytics::patterns::WinLossPatterns;

/// Turnover-ceiling insight is only reported when wins stayed at or under
/// this many turnovers.
const MAX_TO_FOR_INSIGHT: u32 = 15;

/// Threshold values print without a trailing `.0` when whole.
fn format_threshold(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Deterministic sentences over win/loss patterns, in a fixed order.
pub fn generate_auto_insights(patterns: &WinLossPatterns) -> Vec<String> {
    let wins = &patterns.win_conditions;
    let losses = &patterns.loss_conditions;
    let records = &patterns.threshold_records;
    let mut insights = Vec::new();

    if patterns.total_wins > 0 && wins.max_to <= MAX_TO_FOR_INSIGHT {
        insights.push(format!(
            "Team is {}-0 when turnovers ≤ {}",
            patterns.total_wins, wins.max_to
        ));
    }

    if wins.min_fg_pct > 0.0 {
        insights.push(format!(
            "Team is undefeated when FG% ≥ {:.1}%",
            wins.min_fg_pct
        ));
    }

    if patterns.total_losses > 0 {
        insights.push(format!(
            "In losses, team averages {:.1} TO vs {:.1} in wins",
            losses.avg_to, wins.avg_to
        ));
    }

    insights.push(format!(
        "Record when TO ≤ {}: {}",
        records.turnover_threshold, records.to_at_or_below
    ));
    insights.push(format!(
        "Record when FG% ≥ {}%: {}",
        format_threshold(records.fg_pct_threshold),
        records.fg_pct_at_or_above
    ));

    insights
}
