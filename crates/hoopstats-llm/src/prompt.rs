// Prompt templates for season, player, game, and free-form analysis.
//
// Each builder pairs a role-specific system prompt with the rendered season
// context, and puts pre-computed numbers in the user message so the model
// reasons about them instead of doing arithmetic.

use std::str::FromStr;

use serde::Deserialize;

use hoopstats_core::analytics::game::GameAdvancedStats;
use hoopstats_core::analytics::player::PlayerAdvancedStats;
use hoopstats_core::analytics::team::TeamAdvancedStats;
use hoopstats_core::model::{Game, SeasonPlayerStats};
use hoopstats_core::roster::{Resolution, Roster};

use crate::protocol::{ChatMessage, Prompt};

/// Longest free-form question accepted, in characters.
pub const MAX_QUERY_CHARS: usize = 1000;

/// History entries longer than this are dropped rather than truncated.
pub const MAX_HISTORY_MESSAGE_CHARS: usize = 2000;

/// History entries considered before the client's own turn limit applies.
pub const HISTORY_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("question is empty")]
    EmptyQuery,

    #[error("question is {len} characters, the limit is {max}")]
    QueryTooLong { len: usize, max: usize },
}

// ---------------------------------------------------------------------------
// Analysis kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisKind {
    General,
    Player,
    Team,
    Trends,
    Coaching,
    Game,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::General,
        AnalysisKind::Player,
        AnalysisKind::Team,
        AnalysisKind::Trends,
        AnalysisKind::Coaching,
        AnalysisKind::Game,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::General => "general",
            AnalysisKind::Player => "player",
            AnalysisKind::Team => "team",
            AnalysisKind::Trends => "trends",
            AnalysisKind::Coaching => "coaching",
            AnalysisKind::Game => "game",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            AnalysisKind::General => {
                "You are a diagnostic basketball analyst. Identify:\n\
                 - MEASURABLE GAPS vs season averages\n\
                 - ROOT CAUSES through measurable conditions\n\
                 - ACTIONABLE TACTICAL ADJUSTMENTS\n\
                 \n\
                 Do NOT speculate beyond data or suggest practice drills."
            }
            AnalysisKind::Player => {
                "Perform diagnostic player evaluation using box score data only. Identify:\n\
                 - PERFORMANCE DELTA vs season baseline\n\
                 - EFFICIENCY vs usage relationship\n\
                 - ROLE ALIGNMENT"
            }
            AnalysisKind::Team => {
                "Analyze team tactics using box score data. Identify:\n\
                 - STAT-DRIVEN WIN/LOSS CONDITIONS\n\
                 - OFFENSIVE DEPENDENCIES\n\
                 - TOP 3 TACTICAL ADJUSTMENTS ranked by impact"
            }
            AnalysisKind::Trends => {
                "Identify patterns using numeric trends. Analyze:\n\
                 - VOLATILITY (highest variance stats)\n\
                 - DIRECTIONAL SHIFTS\n\
                 - RISK SIGNALS correlated with losses"
            }
            AnalysisKind::Coaching => {
                "Evaluate game management from box score outcomes. Analyze:\n\
                 - ROTATION IMPACT using +/-\n\
                 - LINEUP DEPENDENCE\n\
                 - GAME CONTROL METRICS"
            }
            AnalysisKind::Game => {
                "You are a basketball coach reviewing one game. Be specific about player \
                 performances, shooting efficiency, and the adjustments the numbers support."
            }
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AnalysisKind::ALL
            .into_iter()
            .find(|k| k.as_str() == wanted)
            .ok_or_else(|| format!("unknown analysis kind '{s}'"))
    }
}

// ---------------------------------------------------------------------------
// Token budgets
// ---------------------------------------------------------------------------

/// `max_tokens` per request type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TokenBudget {
    pub analysis: u32,
    pub player: u32,
    pub game: u32,
    pub summary: u32,
    pub chat: u32,
}

impl Default for TokenBudget {
    fn default() -> Self {
        Self {
            analysis: 1500,
            player: 1000,
            game: 800,
            summary: 2000,
            chat: 1000,
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn with_context(instructions: &str, context: &str) -> String {
    format!("{instructions}\n\nTEAM DATA:\n{context}")
}

fn check_query(query: &str) -> Result<&str, PromptError> {
    let query = query.trim();
    if query.is_empty() {
        return Err(PromptError::EmptyQuery);
    }
    let len = query.chars().count();
    if len > MAX_QUERY_CHARS {
        return Err(PromptError::QueryTooLong {
            len,
            max: MAX_QUERY_CHARS,
        });
    }
    Ok(query)
}

/// Keep the last `HISTORY_WINDOW` turns, dropping blank and oversized ones.
pub fn sanitize_history(history: &[ChatMessage]) -> Vec<ChatMessage> {
    let skip = history.len().saturating_sub(HISTORY_WINDOW);
    history[skip..]
        .iter()
        .filter(|m| {
            let content = m.content.trim();
            !content.is_empty() && content.chars().count() <= MAX_HISTORY_MESSAGE_CHARS
        })
        .map(|m| ChatMessage {
            role: m.role,
            content: m.content.trim().to_string(),
        })
        .collect()
}

/// How a stat-sheet name should read in a prompt, using the roster when it
/// resolves.
fn display_name(stat_name: &str, roster: &Roster) -> String {
    match roster.resolve(stat_name) {
        Resolution::Exact(e) | Resolution::Abbreviated(e) => {
            let mut details = Vec::new();
            if let Some(n) = e.number {
                details.push(format!("#{n}"));
            }
            if let Some(grade) = &e.grade {
                details.push(grade.clone());
            }
            if details.is_empty() {
                e.name.clone()
            } else {
                format!("{} ({})", e.name, details.join(", "))
            }
        }
        Resolution::Unresolved => stat_name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Free-form question answered from the season context with the
/// instructions for `kind`.
pub fn build_analysis_prompt(
    kind: AnalysisKind,
    context: &str,
    query: &str,
    budget: &TokenBudget,
) -> Result<Prompt, PromptError> {
    let query = check_query(query)?;
    Ok(Prompt::new(
        with_context(kind.system_prompt(), context),
        query.to_string(),
        budget.analysis,
    ))
}

/// Conversational question with prior turns.
pub fn build_chat_prompt(
    context: &str,
    message: &str,
    history: &[ChatMessage],
    budget: &TokenBudget,
) -> Result<Prompt, PromptError> {
    let message = check_query(message)?;
    let system = with_context(
        "You are an expert basketball statistics analyst. Use ONLY the provided stats data.\n\
         Always reference exact numbers from the data. Never make up statistics.",
        context,
    );
    Ok(Prompt::new(system, message.to_string(), budget.chat).with_history(sanitize_history(history)))
}

pub fn build_player_prompt(
    context: &str,
    player: &SeasonPlayerStats,
    advanced: Option<&PlayerAdvancedStats>,
    roster: &Roster,
    budget: &TokenBudget,
) -> Prompt {
    let t = &player.totals;
    let mut user = String::with_capacity(1024);
    user.push_str(&format!(
        "Analyze {}'s performance this season:\n",
        display_name(&player.name, roster)
    ));
    user.push_str(&format!("- PPG: {:.1}\n", player.ppg));
    user.push_str(&format!("- RPG: {:.1}\n", player.rpg));
    user.push_str(&format!("- APG: {:.1}\n", player.apg));
    user.push_str(&format!("- FG%: {:.1}%\n", t.fg_pct()));
    user.push_str(&format!("- 3P%: {:.1}%\n", t.fg3_pct()));
    user.push_str(&format!("- FT%: {:.1}%\n", t.ft_pct()));
    user.push_str(&format!("- Games: {}\n", player.games));
    user.push_str(&format!("- Plus/minus: {:+}\n", player.plus_minus));

    if let Some(adv) = advanced {
        let s = &adv.scoring_efficiency;
        let u = &adv.usage_role;
        user.push_str("\nAdvanced metrics:\n");
        user.push_str(&format!(
            "- Role: {} (usage {:.1}%, scoring share {:.1}%)\n",
            u.role, u.usage_proxy, u.scoring_share
        ));
        user.push_str(&format!(
            "- eFG {:.1}%, TS {:.1}%, efficiency {:.1} (grade {})\n",
            s.efg_pct, s.ts_pct, s.efficiency_rating, s.efficiency_grade
        ));
        user.push_str(&format!(
            "- Consistency {:.1} (points variance {:.1})\n",
            adv.consistency.consistency_score, adv.consistency.pts_variance
        ));
        let c = &adv.clutch_performance;
        user.push_str(&format!(
            "- Close games: {} played, {:.1} PPG, {:.1}% FG, factor {:.2}\n",
            c.clutch_games, c.clutch_ppg, c.clutch_fg_pct, c.clutch_factor
        ));
    }

    user.push_str(
        "\nProvide:\n\
         1. Performance summary (strengths and areas for improvement)\n\
         2. Comparison to team averages\n\
         3. Specific coaching recommendations\n\
         4. Development areas and potential\n\
         5. Role on the team",
    );

    Prompt::new(
        with_context(AnalysisKind::Player.system_prompt(), context),
        user,
        budget.player,
    )
}

pub fn build_game_prompt(
    context: &str,
    team_name: &str,
    game: &Game,
    advanced: &GameAdvancedStats,
    budget: &TokenBudget,
) -> Prompt {
    let t = &game.team_stats;
    let team = if team_name.is_empty() { "Team" } else { team_name };
    let mut user = String::with_capacity(1024);
    user.push_str(&format!(
        "Analyze {team}'s game vs {} on {}:\n",
        game.opponent, game.date
    ));
    user.push_str(&format!(
        "{team} {} - {} {} ({})\n\n",
        game.vc_score,
        game.opponent,
        game.opp_score,
        game.result()
    ));
    user.push_str("Team Stats:\n");
    user.push_str(&format!("- FG: {}-{} ({:.1}%)\n", t.fg, t.fga, t.fg_pct()));
    user.push_str(&format!("- 3P: {}-{}\n", t.fg3, t.fg3a));
    user.push_str(&format!("- FT: {}-{}\n", t.ft, t.fta));
    user.push_str(&format!("- Rebounds: {}\n", t.reb));
    user.push_str(&format!("- Assists: {}\n", t.asst));
    user.push_str(&format!("- Turnovers: {}\n", t.to));
    user.push_str(&format!(
        "- PPP {:.3}, eFG {:.1}%, TS {:.1}%, TO per 100 {:.1}\n",
        advanced.efficiency.ppp,
        advanced.efficiency.efg_pct,
        advanced.efficiency.ts_pct,
        advanced.possession.to_per_100
    ));

    let mut players: Vec<_> = game.player_stats.iter().collect();
    players.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
    if !players.is_empty() {
        user.push_str("\nPlayers:\n");
        for p in players {
            user.push_str(&format!(
                "- {}: {} pts, {}-{} FG, {} reb, {} ast, {} to, {:+}\n",
                p.name, p.points, p.line.fg, p.line.fga, p.line.reb, p.line.asst, p.line.to, p.plus_minus
            ));
        }
    }

    user.push_str(
        "\nProvide:\n\
         1. Game summary and key moments\n\
         2. What went well\n\
         3. What needs improvement\n\
         4. Individual player performances (top performers)\n\
         5. Coaching adjustments for next game",
    );

    Prompt::new(
        with_context(AnalysisKind::Game.system_prompt(), context),
        user,
        budget.game,
    )
}

pub fn build_team_summary_prompt(
    context: &str,
    team: Option<&TeamAdvancedStats>,
    insights: &[String],
    budget: &TokenBudget,
) -> Prompt {
    let mut user = String::with_capacity(1024);
    if let Some(adv) = team {
        let s = &adv.scoring_efficiency;
        let p = &adv.possession_control;
        user.push_str("Season advanced metrics:\n");
        user.push_str(&format!(
            "- PPP {:.3}, eFG {:.1}%, TS {:.1}%\n",
            s.ppp, s.efg_pct, s.ts_pct
        ));
        user.push_str(&format!(
            "- TO per 100 possessions {:.1}, AST/TO {:.2}\n",
            p.to_per_100, p.ast_to_ratio
        ));
        user.push_str(&format!(
            "- Assisted scoring {:.1}%, 3PA rate {:.1}%\n\n",
            adv.ball_movement.assisted_scoring_rate, adv.shot_mix.fg3_attempt_rate
        ));
    }
    if !insights.is_empty() {
        user.push_str("Observed patterns:\n");
        for line in insights {
            user.push_str(&format!("- {line}\n"));
        }
        user.push('\n');
    }
    user.push_str(
        "Provide a comprehensive team analysis including:\n\
         1. Season performance summary\n\
         2. Team strengths\n\
         3. Areas needing improvement\n\
         4. Key players and their roles\n\
         5. Trends and patterns (winning/losing patterns, momentum)\n\
         6. Coaching recommendations for rest of season\n\
         7. Individual player development focus areas",
    );

    Prompt::new(
        with_context(AnalysisKind::Team.system_prompt(), context),
        user,
        budget.summary,
    )
}
