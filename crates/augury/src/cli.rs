//! CLI entry arguments. The binary's sole purpose is launching the TUI;
//! flags only override what `config.toml` provides.

use clap::Parser;

use crate::config::AppConfig;
use crate::tui::app::AppOptions;

#[derive(Parser, Debug)]
#[command(name = "augury", about = "IOC intelligence lookup TUI", version)]
pub struct Cli {
    /// Backend base URL (overrides config.toml)
    #[arg(long, env = "AUGURY_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Identity sent as X-User-Name (overrides config.toml)
    #[arg(long)]
    pub user_name: Option<String>,

    /// Enable verbose logging
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

impl Cli {
    /// Merge flags over the loaded config: flags win, config fills gaps.
    pub fn resolve(&self, config: &AppConfig) -> AppOptions {
        AppOptions {
            backend_url: self
                .backend_url
                .clone()
                .unwrap_or_else(|| config.backend_url.clone()),
            user_name: self.user_name.clone().or_else(|| config.user_name.clone()),
            theme: config.theme.clone(),
        }
    }
}
