//! Augury launcher: parse flags, hydrate config and preferences, start
//! the TUI event loop.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use augury::api::BackendClient;
use augury::cli::Cli;
use augury::config::{preferences_path, AppConfig, TomlPreferenceStore};
use augury::tui;
use augury_logging::{init_logging, LogConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Held for the process lifetime; dropping it loses buffered log lines.
    let _log_guard = match init_logging(LogConfig {
        verbose: cli.verbose,
        tui_mode: true,
    }) {
        Ok(guard) => Some(guard),
        Err(err) => {
            eprintln!("Warning: logging unavailable: {err:#}");
            None
        }
    };

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load();
    let options = cli.resolve(&config);
    info!(backend_url = %options.backend_url, "starting augury");

    let backend = Arc::new(BackendClient::new(&options.backend_url));
    let prefs = Box::new(TomlPreferenceStore::open(preferences_path()));

    tui::run(options, backend, prefs).await
}
