//! Runtime configuration.
//!
//! Values come from built-in defaults, optionally overridden by a JSON file
//! (`--config`), then by command-line flags.
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::i18n::Language;
use crate::walker::{WalkerConfig, DEFAULT_WINDOW};

/// Default journal database file, relative to the working directory.
pub const DEFAULT_DB_FILE: &str = "btc_jornal.db";

/// Everything the binary needs to wire a walker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Esplora base URL.
    pub api_base: String,
    /// SQLite journal file.
    pub db_path: PathBuf,
    /// Preset language; prompted for when absent.
    pub language: Option<Language>,
    /// Backlog size in blocks.
    pub window: u32,
    /// Idle wait between tip polls, seconds.
    pub poll_interval_secs: u64,
    /// Wait before retrying a failed fetch, seconds.
    pub error_backoff_secs: u64,
    /// Block fetches kept in flight during catch-up.
    pub prefetch: usize,
    /// Never prompt between blocks.
    pub auto_advance: bool,
    /// Provider request timeout, seconds.
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: "https://blockstream.info/api".into(),
            db_path: PathBuf::from(DEFAULT_DB_FILE),
            language: None,
            window: DEFAULT_WINDOW,
            poll_interval_secs: 10,
            error_backoff_secs: 5,
            prefetch: 1,
            auto_advance: false,
            request_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Read a JSON config file. Missing keys keep their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    /// Defaults, or the file at `path` when given.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Walker tunables derived from this config.
    pub fn walker(&self) -> WalkerConfig {
        WalkerConfig {
            window: self.window,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            error_backoff: Duration::from_secs(self.error_backoff_secs),
            prefetch: self.prefetch.max(1),
        }
    }

    /// Provider request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
