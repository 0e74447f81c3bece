//! Configuration and preference persistence for Augury.
//!
//! Static configuration (backend URL, startup defaults) lives in
//! `~/.augury/config.toml` and is read once. Runtime preferences (identity,
//! theme) write through the [`PreferenceStore`] port so the UI core never
//! touches the filesystem directly and tests can run against memory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub use augury_logging::augury_home;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";

/// Preference keys. Flat key-value pairs; an absent key means default.
pub const PREF_USER_NAME: &str = "user_name";
pub const PREF_THEME: &str = "theme";

/// Path to the static config file: ~/.augury/config.toml
pub fn config_path() -> PathBuf {
    augury_home().join("config.toml")
}

/// Path to the preference file: ~/.augury/preferences.toml
pub fn preferences_path() -> PathBuf {
    augury_home().join("preferences.toml")
}

// ============================================================================
// Static configuration
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the IOC backend.
    pub backend_url: String,
    /// Startup identity; the preference store takes precedence once set.
    pub user_name: Option<String>,
    /// Startup theme; the preference store takes precedence once set.
    pub theme: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            user_name: None,
            theme: None,
        }
    }
}

impl AppConfig {
    /// Load the config file, falling back to defaults when it is missing
    /// or unreadable. A malformed file is not fatal for a lookup client.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                warn!("Ignoring malformed config {}: {}", path.display(), err);
                Self::default()
            }
        }
    }
}

// ============================================================================
// Theme
// ============================================================================

/// Display theme. Defaults to dark; hydrated once at startup from the
/// preference store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Parse a persisted value, falling back to the default when the key
    /// is absent or unrecognized.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("light") => Theme::Light,
            Some("dark") => Theme::Dark,
            _ => Theme::default(),
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }
}

// ============================================================================
// Preference port
// ============================================================================

/// Persistence port for flat key-value preferences.
pub trait PreferenceStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// TOML-file-backed preference store used by the binary.
pub struct TomlPreferenceStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl TomlPreferenceStore {
    /// Open the store, reading current values. A missing file is an empty
    /// store; a malformed one is replaced on the next write.
    pub fn open(path: PathBuf) -> Self {
        let values = match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(values) => values,
                Err(err) => {
                    warn!("Ignoring malformed preferences {}: {}", path.display(), err);
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self { path, values }
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }
        let contents =
            toml::to_string_pretty(&self.values).context("Failed to serialize preferences")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))
    }
}

impl PreferenceStore for TomlPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: BTreeMap<String, String>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}
