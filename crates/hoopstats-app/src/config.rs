// Configuration loading and parsing (hoopstats.toml, credentials.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use hoopstats_core::analytics::leaders::LEADERBOARD_SIZE;
use hoopstats_core::analytics::patterns::{
    PatternThresholds, FG_PERCENTAGE_THRESHOLD, TURNOVER_THRESHOLD,
};
use hoopstats_core::analytics::volatility::TOP_SCORERS_COUNT;
use hoopstats_core::analytics::{EngineOptions, CLUTCH_MARGIN, STRONG_OPPONENT_SCORE};
use hoopstats_llm::client::{LlmSettings, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MODEL};
use hoopstats_llm::prompt::TokenBudget;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the relative paths in `[data]` are resolved against.
    pub base_dir: PathBuf,
    pub data: DataConfig,
    pub analysis: AnalysisConfig,
    pub llm: LlmConfig,
    pub credentials: CredentialsConfig,
}

/// Deserialization target for hoopstats.toml.
#[derive(Debug, Clone, Deserialize)]
struct ConfigFile {
    data: DataConfig,
    #[serde(default)]
    analysis: AnalysisConfig,
    #[serde(default)]
    llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub stats_path: String,
    #[serde(default)]
    pub roster_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub turnover_threshold: u32,
    pub fg_pct_threshold: f64,
    pub clutch_margin: u32,
    pub strong_opponent_score: u32,
    pub top_scorers_count: usize,
    pub leaderboard_size: usize,
    /// Stat-sheet names kept out of LLM context.
    pub excluded_players: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            turnover_threshold: TURNOVER_THRESHOLD,
            fg_pct_threshold: FG_PERCENTAGE_THRESHOLD,
            clutch_margin: CLUTCH_MARGIN,
            strong_opponent_score: STRONG_OPPONENT_SCORE,
            top_scorers_count: TOP_SCORERS_COUNT,
            leaderboard_size: LEADERBOARD_SIZE,
            excluded_players: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub connect_timeout_secs: u64,
    pub max_tokens: TokenBudget,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            max_tokens: TokenBudget::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub anthropic_api_key: Option<String>,
}

impl Config {
    pub fn engine_options(&self) -> EngineOptions {
        let a = &self.analysis;
        EngineOptions {
            thresholds: PatternThresholds {
                turnovers: a.turnover_threshold,
                fg_pct: a.fg_pct_threshold,
            },
            clutch_margin: a.clutch_margin,
            strong_opponent_score: a.strong_opponent_score,
            top_scorers_count: a.top_scorers_count,
            leaderboard_size: a.leaderboard_size,
        }
    }

    pub fn llm_settings(&self) -> LlmSettings {
        LlmSettings {
            api_key: self.credentials.anthropic_api_key.clone(),
            model: self.llm.model.clone(),
            connect_timeout_secs: self.llm.connect_timeout_secs,
        }
    }

    pub fn stats_path(&self) -> PathBuf {
        self.base_dir.join(&self.data.stats_path)
    }

    pub fn roster_path(&self) -> Option<PathBuf> {
        self.data
            .roster_path
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| self.base_dir.join(p))
    }
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/hoopstats.toml` and, when present,
/// `config/credentials.toml` under `base_dir`. Does not copy defaults.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    let main_path = config_dir.join("hoopstats.toml");
    let main_text = read_file(&main_path)?;
    let file: ConfigFile = toml::from_str(&main_text).map_err(|e| ConfigError::ParseError {
        path: main_path.clone(),
        source: e,
    })?;

    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let text = read_file(&credentials_path)?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let config = Config {
        base_dir: base_dir.to_path_buf(),
        data: file.data,
        analysis: file.analysis,
        llm: file.llm,
        credentials,
    };
    validate(&config)?;
    Ok(config)
}

/// Copy files missing from `config/` out of `defaults/`, skipping `.example`
/// templates. Returns the files copied.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ found in {}",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }
    Ok(copied)
}

/// Copy defaults if needed, then load relative to `base_dir`.
pub fn load_config(base_dir: &Path) -> Result<Config, ConfigError> {
    ensure_config_files(base_dir)?;
    load_config_from(base_dir)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.data.stats_path.trim().is_empty() {
        return Err(invalid("data.stats_path", "must not be empty"));
    }

    let a = &config.analysis;
    if !(0.0..=100.0).contains(&a.fg_pct_threshold) {
        return Err(invalid(
            "analysis.fg_pct_threshold",
            format!("must be between 0 and 100, got {}", a.fg_pct_threshold),
        ));
    }
    let counts: &[(&str, usize)] = &[
        ("analysis.top_scorers_count", a.top_scorers_count),
        ("analysis.leaderboard_size", a.leaderboard_size),
    ];
    for (name, val) in counts {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }

    let llm = &config.llm;
    if llm.model.trim().is_empty() {
        return Err(invalid("llm.model", "must not be empty"));
    }
    let budgets: &[(&str, u32)] = &[
        ("llm.max_tokens.analysis", llm.max_tokens.analysis),
        ("llm.max_tokens.player", llm.max_tokens.player),
        ("llm.max_tokens.game", llm.max_tokens.game),
        ("llm.max_tokens.summary", llm.max_tokens.summary),
        ("llm.max_tokens.chat", llm.max_tokens.chat),
    ];
    for (name, val) in budgets {
        if *val == 0 {
            return Err(invalid(name, "must be > 0"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// The app crate root, where `defaults/` lives.
    fn crate_root() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("hoopstats_config_{name}_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("config")).unwrap();
        dir
    }

    fn write_main(dir: &Path, text: &str) {
        fs::write(dir.join("config/hoopstats.toml"), text).unwrap();
    }

    #[test]
    fn defaults_load_and_match_engine_constants() {
        let dir = scratch("defaults");
        fs::copy(
            crate_root().join("defaults/hoopstats.toml"),
            dir.join("config/hoopstats.toml"),
        )
        .unwrap();
        let config = load_config_from(&dir).unwrap();

        assert_eq!(config.data.stats_path, "data/season.json");
        assert_eq!(config.data.roster_path.as_deref(), Some("data/roster.json"));
        assert_eq!(config.engine_options(), EngineOptions::default());
        assert_eq!(config.llm.max_tokens, TokenBudget::default());
        assert!(config.credentials.anthropic_api_key.is_none());
        assert_eq!(config.stats_path(), dir.join("data/season.json"));
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let dir = scratch("minimal");
        write_main(&dir, "[data]\nstats_path = \"s.json\"\n");
        let config = load_config_from(&dir).unwrap();
        assert_eq!(config.analysis, AnalysisConfig::default());
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert!(config.roster_path().is_none());
    }

    #[test]
    fn overrides_flow_into_engine_options() {
        let dir = scratch("overrides");
        write_main(
            &dir,
            r#"
[data]
stats_path = "s.json"
roster_path = ""

[analysis]
turnover_threshold = 10
fg_pct_threshold = 40.5
excluded_players = ["R Bench"]

[llm.max_tokens]
chat = 600
"#,
        );
        let config = load_config_from(&dir).unwrap();
        let options = config.engine_options();
        assert_eq!(options.thresholds.turnovers, 10);
        assert_eq!(options.thresholds.fg_pct, 40.5);
        assert_eq!(options.clutch_margin, CLUTCH_MARGIN);
        assert_eq!(config.analysis.excluded_players, vec!["R Bench".to_string()]);
        assert_eq!(config.llm.max_tokens.chat, 600);
        assert_eq!(config.llm.max_tokens.game, 800);
        // Blank roster path means no roster.
        assert!(config.roster_path().is_none());
    }

    #[test]
    fn credentials_are_read_when_present() {
        let dir = scratch("creds");
        write_main(&dir, "[data]\nstats_path = \"s.json\"\n");
        fs::write(
            dir.join("config/credentials.toml"),
            "anthropic_api_key = \"sk-test\"\n",
        )
        .unwrap();
        let config = load_config_from(&dir).unwrap();
        assert_eq!(config.llm_settings().api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn missing_main_file() {
        let dir = scratch("missing");
        assert!(matches!(
            load_config_from(&dir),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn malformed_toml() {
        let dir = scratch("malformed");
        write_main(&dir, "[data\nstats_path = 1");
        assert!(matches!(
            load_config_from(&dir),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn validation_names_the_field() {
        let dir = scratch("invalid");
        write_main(
            &dir,
            "[data]\nstats_path = \"s.json\"\n[analysis]\nfg_pct_threshold = 140.0\n",
        );
        match load_config_from(&dir) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "analysis.fg_pct_threshold")
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        write_main(
            &dir,
            "[data]\nstats_path = \"s.json\"\n[llm.max_tokens]\nsummary = 0\n",
        );
        match load_config_from(&dir) {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert_eq!(field, "llm.max_tokens.summary")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn ensure_copies_defaults_but_not_examples() {
        let dir = std::env::temp_dir().join(format!("hoopstats_config_copy_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(dir.join("defaults")).unwrap();
        fs::write(dir.join("defaults/hoopstats.toml"), "[data]\nstats_path = \"a.json\"\n").unwrap();
        fs::write(dir.join("defaults/credentials.toml.example"), "anthropic_api_key = \"\"\n").unwrap();

        let copied = ensure_config_files(&dir).unwrap();
        assert_eq!(copied, vec![dir.join("config/hoopstats.toml")]);
        assert!(!dir.join("config/credentials.toml.example").exists());

        // Existing files are left alone.
        fs::write(dir.join("config/hoopstats.toml"), "[data]\nstats_path = \"b.json\"\n").unwrap();
        assert!(ensure_config_files(&dir).unwrap().is_empty());
        assert_eq!(load_config(&dir).unwrap().data.stats_path, "b.json");
    }

    #[test]
    fn ensure_without_any_dirs_fails() {
        let dir = std::env::temp_dir().join(format!("hoopstats_config_empty_{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        assert!(matches!(
            ensure_config_files(&dir),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
    }
}
