//! Command-line surface of the `hoopstats` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use hoopstats_llm::prompt::AnalysisKind;

#[derive(Debug, Parser)]
#[command(name = "hoopstats")]
#[command(about = "Box-score analytics for a basketball season", long_about = None)]
pub struct Cli {
    /// Directory holding config/, defaults/ and logs/
    #[arg(long, env = "HOOPSTATS_HOME", default_value = ".", global = true)]
    pub home: PathBuf,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Season-level team advanced metrics
    Team,
    /// Advanced metrics for one player
    Player {
        /// Stat-sheet or roster name
        name: String,
    },
    /// Advanced metrics for one game
    Game { id: u32 },
    /// Conditions that separate wins from losses
    Patterns,
    /// Game-to-game spread for the team and top scorers
    Volatility,
    /// Plain-language findings from the win/loss patterns
    Insights,
    /// Everything above in one document
    Report,
    /// Season leaderboards
    Leaders,
    /// Per-game series for the team or one player
    Trends {
        #[arg(long)]
        player: Option<String>,
    },
    /// Side-by-side comparison of two or more players
    Compare {
        #[arg(required = true, num_args = 2..)]
        names: Vec<String>,
    },
    /// Plain-text season summary used as LLM grounding
    Context,
    /// Ask a free-form question about the season
    Ask {
        question: String,
        /// general, player, team, trends, coaching or game
        #[arg(long, default_value = "general")]
        kind: AnalysisKind,
    },
    /// LLM write-up of one player
    AiPlayer { name: String },
    /// LLM write-up of one game
    AiGame { id: u32 },
    /// LLM season summary
    AiSummary,
    /// Conversational question with prior turns
    Chat {
        message: String,
        /// JSON array of {"role", "content"} turns
        #[arg(long)]
        history: Option<PathBuf>,
    },
    /// Write per-game series as CSV
    ExportTrends {
        path: PathBuf,
        #[arg(long)]
        player: Option<String>,
    },
    /// Re-read the stats and roster files
    Reload,
    /// Read commands from stdin until `quit`
    Shell,
}

/// One line typed at the shell prompt.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, disable_help_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}

/// Split a shell line into words. Single and double quotes group words and
/// are stripped; an unterminated quote runs to the end of the line.
pub fn split_words(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }
    if in_word {
        words.push(current);
    }
    words
}

/// Parse one shell line. `Ok(None)` for a blank line.
pub fn parse_shell_line(line: &str) -> Result<Option<Command>, clap::Error> {
    let words = split_words(line);
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words).map(|l| Some(l.command))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_words_stay_together() {
        assert_eq!(
            split_words(r#"player "J Carter"  "#),
            vec!["player", "J Carter"]
        );
        assert_eq!(
            split_words("ask 'who leads in steals?' --kind team"),
            vec!["ask", "who leads in steals?", "--kind", "team"]
        );
        assert_eq!(split_words(r#"compare "" x"#), vec!["compare", "", "x"]);
        assert!(split_words("   ").is_empty());
    }

    #[test]
    fn unterminated_quote_runs_to_end() {
        assert_eq!(split_words("player \"M Lopez"), vec!["player", "M Lopez"]);
    }

    #[test]
    fn parses_top_level_arguments() {
        let cli = Cli::try_parse_from(["hoopstats", "--pretty", "game", "3"]).unwrap();
        assert!(cli.pretty);
        assert_eq!(cli.command, Command::Game { id: 3 });

        let cli = Cli::try_parse_from(["hoopstats", "ask", "why?", "--kind", "Coaching"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Ask {
                question: "why?".to_string(),
                kind: AnalysisKind::Coaching
            }
        );
    }

    #[test]
    fn compare_needs_two_names() {
        assert!(Cli::try_parse_from(["hoopstats", "compare", "J Carter"]).is_err());
        let cli = Cli::try_parse_from(["hoopstats", "compare", "J Carter", "M Lopez"]).unwrap();
        assert!(matches!(cli.command, Command::Compare { names } if names.len() == 2));
    }

    #[test]
    fn shell_lines() {
        assert_eq!(parse_shell_line("").unwrap(), None);
        assert_eq!(
            parse_shell_line("trends --player 'T Nguyen'").unwrap(),
            Some(Command::Trends {
                player: Some("T Nguyen".to_string())
            })
        );
        assert_eq!(parse_shell_line("reload").unwrap(), Some(Command::Reload));
        assert!(parse_shell_line("dunk").is_err());
    }
}
