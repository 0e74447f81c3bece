//! Shared logging and home-directory utilities for the Augury binary.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "augury=info,augury_protocol=info";
const VERBOSE_LOG_FILTER: &str = "augury=debug,augury_protocol=debug";

/// Logging configuration for the Augury binary.
pub struct LogConfig {
    pub verbose: bool,
    /// While the TUI owns the terminal, console output below ERROR is
    /// suppressed so log lines cannot corrupt the alternate screen.
    pub tui_mode: bool,
}

/// Initialize tracing with a daily-rolling file under the Augury home and
/// a stderr console layer.
///
/// Returns the appender guard; the caller must hold it for the process
/// lifetime or buffered log lines are dropped on exit.
pub fn init_logging(config: LogConfig) -> Result<WorkerGuard> {
    let log_dir = ensure_logs_dir().context("Failed to ensure log directory")?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "augury.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let default_filter = if config.verbose {
        VERBOSE_LOG_FILTER
    } else {
        DEFAULT_LOG_FILTER
    };
    let file_filter =
        EnvFilter::try_from_env("AUGURY_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console_filter = if config.tui_mode {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("AUGURY_LOG").unwrap_or_else(|_| EnvFilter::new(default_filter))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_filter(file_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();

    Ok(guard)
}

/// Resolve the Augury home directory.
///
/// Priority:
/// 1) AUGURY_HOME
/// 2) platform home directory
/// 3) ./.augury
pub fn augury_home() -> PathBuf {
    if let Ok(override_path) = std::env::var("AUGURY_HOME") {
        return PathBuf::from(override_path);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".augury"),
        None => PathBuf::from(".").join(".augury"),
    }
}

/// Logs directory: ~/.augury/logs
pub fn logs_dir() -> PathBuf {
    augury_home().join("logs")
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = logs_dir();
    fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}
