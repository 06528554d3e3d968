// Command dispatch over the loaded season.
//
// Every command reads one snapshot of the dataset, so a reload in the shell
// never mixes two versions of the files within a single answer. Report-backed
// commands share the memoized season report.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use hoopstats_core::analytics::player::PlayerAdvancedStats;
use hoopstats_core::analytics::{EngineOptions, SeasonReport};
use hoopstats_core::cache::{DatasetStore, LoadedDataset, ReportCache};
use hoopstats_core::dataset::DatasetError;
use hoopstats_core::model::SeasonPlayerStats;
use hoopstats_core::roster::RosterEntry;
use hoopstats_llm::client::Commentator;
use hoopstats_llm::context::build_stats_context;
use hoopstats_llm::prompt::{self, AnalysisKind, PromptError};
use hoopstats_llm::protocol::{ChatMessage, Completion, Prompt};

use crate::cli::{self, Command};
use crate::config::Config;
use crate::export;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("LLM commentary is not configured; set anthropic_api_key in config/credentials.toml")]
    LlmUnavailable,

    #[error("LLM request failed: {0}")]
    Llm(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV export failed: {0}")]
    Export(#[from] csv::Error),
}

// ---------------------------------------------------------------------------
// Output shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct PlayerView<'a> {
    season: &'a SeasonPlayerStats,
    roster: Option<&'a RosterEntry>,
    advanced: &'a PlayerAdvancedStats,
}

#[derive(Debug, Serialize)]
struct Narrative<'a> {
    kind: &'a str,
    text: String,
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ReloadSummary {
    fingerprint: String,
    loaded_at: String,
    games: usize,
    players: usize,
}

#[derive(Debug, Serialize)]
struct ExportSummary {
    path: PathBuf,
    rows: usize,
}

fn render<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String, AppError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(text)
}

/// Stat-sheet key for a player query: exact key, then a case-insensitive key
/// match, then a roster full name whose stat-sheet name is in the season.
fn resolve_player(loaded: &LoadedDataset, query: &str) -> Option<String> {
    let players = &loaded.dataset.season_player_stats;
    let query = query.trim();
    if players.contains_key(query) {
        return Some(query.to_string());
    }
    players
        .keys()
        .find(|k| k.eq_ignore_ascii_case(query))
        .or_else(|| {
            players.keys().find(|k| {
                loaded
                    .roster
                    .resolve(k)
                    .entry()
                    .is_some_and(|e| e.name.eq_ignore_ascii_case(query))
            })
        })
        .cloned()
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    config: Config,
    options: EngineOptions,
    store: DatasetStore,
    cache: ReportCache,
    commentator: Box<dyn Commentator>,
}

impl App {
    /// Load the configured season files.
    pub fn open(config: Config, commentator: Box<dyn Commentator>) -> Result<Self, AppError> {
        let stats_path = config.stats_path();
        let roster_path = config.roster_path();
        let store = DatasetStore::open(&stats_path, roster_path.as_deref())?;
        {
            let loaded = store.current();
            info!(
                "Loaded {} games, {} players from {}",
                loaded.dataset.games.len(),
                loaded.dataset.season_player_stats.len(),
                stats_path.display()
            );
        }
        Ok(Self {
            options: config.engine_options(),
            config,
            store,
            cache: ReportCache::new(),
            commentator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn report(&self, loaded: &LoadedDataset) -> Arc<SeasonReport> {
        self.cache.get_or_compute(loaded, &self.options)
    }

    fn context(&self, loaded: &LoadedDataset) -> String {
        build_stats_context(&loaded.dataset, &self.config.analysis.excluded_players)
    }

    fn require_player(&self, loaded: &LoadedDataset, name: &str) -> Result<String, AppError> {
        resolve_player(loaded, name).ok_or_else(|| AppError::NotFound(format!("player '{name}'")))
    }

    async fn narrate(&self, kind: AnalysisKind, prompt: &Prompt, pretty: bool) -> Result<String, AppError> {
        info!(
            "Requesting {} commentary (max_tokens={})",
            kind.as_str(),
            prompt.max_tokens
        );
        let Completion {
            text,
            input_tokens,
            output_tokens,
        } = self
            .commentator
            .narrate(prompt)
            .await
            .map_err(|e| AppError::Llm(format!("{e:#}")))?;
        debug!("commentary used {} input, {} output tokens", input_tokens, output_tokens);
        render(
            &Narrative {
                kind: kind.as_str(),
                text,
                input_tokens,
                output_tokens,
            },
            pretty,
        )
    }

    fn require_llm(&self) -> Result<(), AppError> {
        if self.commentator.is_available() {
            Ok(())
        } else {
            Err(AppError::LlmUnavailable)
        }
    }

    /// Run one command and return what should be printed.
    pub async fn execute(&self, command: &Command, pretty: bool) -> Result<String, AppError> {
        debug!("executing {:?}", command);
        let loaded = self.store.current();
        let budget = &self.config.llm.max_tokens;

        match command {
            Command::Team => {
                let report = self.report(&loaded);
                let team = report
                    .team_advanced
                    .as_ref()
                    .ok_or_else(|| AppError::NotFound("team stats (no games played)".into()))?;
                render(team, pretty)
            }
            Command::Player { name } => {
                let key = self.require_player(&loaded, name)?;
                let report = self.report(&loaded);
                let advanced = report
                    .player_advanced
                    .get(&key)
                    .ok_or_else(|| AppError::NotFound(format!("games for player '{key}'")))?;
                let season = loaded
                    .dataset
                    .player(&key)
                    .ok_or_else(|| AppError::NotFound(format!("player '{key}'")))?;
                render(
                    &PlayerView {
                        season,
                        roster: loaded.roster.resolve(&key).entry(),
                        advanced,
                    },
                    pretty,
                )
            }
            Command::Game { id } => {
                let report = self.report(&loaded);
                let game = report
                    .game_advanced
                    .iter()
                    .find(|g| g.game_id == *id)
                    .ok_or_else(|| AppError::NotFound(format!("game {id}")))?;
                render(game, pretty)
            }
            Command::Patterns => render(&self.report(&loaded).patterns, pretty),
            Command::Volatility => render(&self.report(&loaded).volatility, pretty),
            Command::Insights => render(&self.report(&loaded).insights, pretty),
            Command::Report => render(&*self.report(&loaded), pretty),
            Command::Leaders => render(&loaded.engine(&self.options).leaderboards(), pretty),
            Command::Trends { player: None } => {
                render(&loaded.engine(&self.options).team_trends(), pretty)
            }
            Command::Trends { player: Some(name) } => {
                let key = self.require_player(&loaded, name)?;
                let trends = loaded
                    .engine(&self.options)
                    .player_trends(&key)
                    .ok_or_else(|| AppError::NotFound(format!("game log for '{key}'")))?;
                render(&trends, pretty)
            }
            Command::Compare { names } => {
                let keys: Vec<String> = names
                    .iter()
                    .map(|n| resolve_player(&loaded, n).unwrap_or_else(|| n.clone()))
                    .collect();
                let compared = loaded.engine(&self.options).compare(&keys);
                if compared.len() < 2 {
                    return Err(AppError::InvalidArgs(format!(
                        "need at least two known players to compare, found {}",
                        compared.len()
                    )));
                }
                render(&compared, pretty)
            }
            Command::Context => Ok(self.context(&loaded)),
            Command::Ask { question, kind } => {
                self.require_llm()?;
                let prompt =
                    prompt::build_analysis_prompt(*kind, &self.context(&loaded), question, budget)?;
                self.narrate(*kind, &prompt, pretty).await
            }
            Command::AiPlayer { name } => {
                self.require_llm()?;
                let key = self.require_player(&loaded, name)?;
                let season = loaded
                    .dataset
                    .player(&key)
                    .ok_or_else(|| AppError::NotFound(format!("player '{key}'")))?;
                let report = self.report(&loaded);
                let prompt = prompt::build_player_prompt(
                    &self.context(&loaded),
                    season,
                    report.player_advanced.get(&key),
                    &loaded.roster,
                    budget,
                );
                self.narrate(AnalysisKind::Player, &prompt, pretty).await
            }
            Command::AiGame { id } => {
                self.require_llm()?;
                let game = loaded
                    .dataset
                    .game(*id)
                    .ok_or_else(|| AppError::NotFound(format!("game {id}")))?;
                let report = self.report(&loaded);
                let advanced = report
                    .game_advanced
                    .iter()
                    .find(|g| g.game_id == *id)
                    .ok_or_else(|| AppError::NotFound(format!("game {id}")))?;
                let prompt = prompt::build_game_prompt(
                    &self.context(&loaded),
                    &loaded.dataset.team,
                    game,
                    advanced,
                    budget,
                );
                self.narrate(AnalysisKind::Game, &prompt, pretty).await
            }
            Command::AiSummary => {
                self.require_llm()?;
                let report = self.report(&loaded);
                let prompt = prompt::build_team_summary_prompt(
                    &self.context(&loaded),
                    report.team_advanced.as_ref(),
                    &report.insights,
                    budget,
                );
                self.narrate(AnalysisKind::Team, &prompt, pretty).await
            }
            Command::Chat { message, history } => {
                self.require_llm()?;
                let history: Vec<ChatMessage> = match history {
                    Some(path) => {
                        let text = tokio::fs::read_to_string(path).await.map_err(|source| {
                            AppError::Io {
                                path: path.clone(),
                                source,
                            }
                        })?;
                        serde_json::from_str(&text)?
                    }
                    None => Vec::new(),
                };
                let prompt =
                    prompt::build_chat_prompt(&self.context(&loaded), message, &history, budget)?;
                self.narrate(AnalysisKind::General, &prompt, pretty).await
            }
            Command::ExportTrends { path, player } => {
                let engine = loaded.engine(&self.options);
                // Resolve before touching the file so a bad name leaves it alone.
                let player_trends = match player {
                    None => None,
                    Some(name) => {
                        let key = self.require_player(&loaded, name)?;
                        let trends = engine
                            .player_trends(&key)
                            .ok_or_else(|| AppError::NotFound(format!("game log for '{key}'")))?;
                        Some(trends)
                    }
                };
                let file = std::fs::File::create(path).map_err(|source| AppError::Io {
                    path: path.clone(),
                    source,
                })?;
                let rows = match &player_trends {
                    Some(trends) => export::write_player_trends(trends, file)?,
                    None => export::write_team_trends(&engine.team_trends(), file)?,
                };
                info!("Exported {} trend rows to {}", rows, path.display());
                render(
                    &ExportSummary {
                        path: path.clone(),
                        rows,
                    },
                    pretty,
                )
            }
            Command::Reload => {
                let previous = loaded.fingerprint.clone();
                let fresh = self.store.reload()?;
                if fresh.fingerprint != previous {
                    self.cache.invalidate();
                }
                render(
                    &ReloadSummary {
                        fingerprint: fresh.fingerprint.clone(),
                        loaded_at: fresh.loaded_at.to_rfc3339(),
                        games: fresh.dataset.games.len(),
                        players: fresh.dataset.season_player_stats.len(),
                    },
                    pretty,
                )
            }
            Command::Shell => Err(AppError::InvalidArgs("already in a shell".into())),
        }
    }

    /// Read commands line by line until `quit`, `exit` or end of input.
    /// Errors are printed and the loop continues.
    pub async fn run_shell<R, W>(&self, input: R, mut output: W, pretty: bool) -> Result<(), AppError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let io_err = |source: std::io::Error| AppError::Io {
            path: PathBuf::from("<stdio>"),
            source,
        };
        let mut lines = input.lines();
        loop {
            output.write_all(b"hoopstats> ").await.map_err(io_err)?;
            output.flush().await.map_err(io_err)?;
            let Some(line) = lines.next_line().await.map_err(io_err)? else {
                break;
            };
            let trimmed = line.trim();
            if trimmed == "quit" || trimmed == "exit" {
                break;
            }
            let reply = match cli::parse_shell_line(trimmed) {
                Ok(None) => continue,
                Ok(Some(command)) => match self.execute(&command, pretty).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("shell command failed: {}", e);
                        format!("error: {e}")
                    }
                },
                Err(e) => e.to_string().trim_end().to_string(),
            };
            output.write_all(reply.as_bytes()).await.map_err(io_err)?;
            output.write_all(b"\n").await.map_err(io_err)?;
        }
        output.write_all(b"\n").await.map_err(io_err)?;
        output.flush().await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_compact_and_pretty() {
        let value = vec![1, 2];
        assert_eq!(render(&value, false).unwrap(), "[1,2]");
        assert_eq!(render(&value, true).unwrap(), "[\n  1,\n  2\n]");
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            AppError::NotFound("game 9".into()).to_string(),
            "not found: game 9"
        );
        let e = AppError::Io {
            path: PathBuf::from("out/trends.csv"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(e.to_string(), "I/O error on out/trends.csv: missing");
        let e: AppError = PromptError::EmptyQuery.into();
        assert_eq!(e.to_string(), PromptError::EmptyQuery.to_string());
    }
}
