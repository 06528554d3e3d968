// hoopstats entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (log to file, stdout carries command output)
// 3. Load config, copying defaults on first run
// 4. Build the LLM client and load the season
// 5. Run the command, or the shell

use hoopstats_app::app::App;
use hoopstats_app::cli::{Cli, Command};
use hoopstats_app::config;
use hoopstats_llm::client::LlmClient;

use anyhow::Context;
use clap::Parser;
use std::path::Path;
use std::sync::Mutex;
use tokio::io::BufReader;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.home)?;
    info!("hoopstats starting in {}", cli.home.display());

    let config = config::load_config(&cli.home).context("failed to load configuration")?;
    info!(
        "Config loaded: stats={}, model={}",
        config.data.stats_path, config.llm.model
    );

    let llm = LlmClient::from_settings(&config.llm_settings())
        .context("failed to build LLM client")?;
    match &llm {
        LlmClient::Active(_) => info!("LLM client initialized (API key configured)"),
        LlmClient::Disabled => info!("LLM client disabled (no API key)"),
    }

    let app = App::open(config, Box::new(llm)).context("failed to load season data")?;

    if cli.command == Command::Shell {
        let stdin = BufReader::new(tokio::io::stdin());
        app.run_shell(stdin, tokio::io::stdout(), cli.pretty)
            .await
            .context("shell failed")?;
        return Ok(());
    }

    match app.execute(&cli.command, cli.pretty).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            error!("command failed: {}", e);
            Err(e.into())
        }
    }
}

/// Initialize tracing to append to `logs/hoopstats.log` under `home`.
fn init_tracing(home: &Path) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = home.join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("hoopstats.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoopstats=info,warn")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
