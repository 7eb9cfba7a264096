//! Dex configuration.
//!
//! Settings come from `<config_dir>/sheetdex/config.json` when it exists,
//! then from `SHEETDEX_*` environment variables. Missing values fall back to
//! the defaults below.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "sheetdex";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// CSV export of the shared mon sheet.
pub const DEFAULT_SHEET_URL: &str = "https://docs.google.com/spreadsheets/d/1qa13OkWHd2Am1QPsy6UC41OMDwjp6E_bMQ5usTaylFs/export?format=csv&gid=0";

pub const ENV_SHEET_URL: &str = "SHEETDEX_SHEET_URL";
pub const ENV_PRIMARY_REFRESH_SECS: &str = "SHEETDEX_PRIMARY_REFRESH_SECS";
pub const ENV_SECONDARY_REFRESH_SECS: &str = "SHEETDEX_SECONDARY_REFRESH_SECS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "SHEETDEX_FETCH_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sheet_url: String,
    /// Minimum seconds between fetches of the mon sheet.
    pub primary_refresh_secs: u64,
    /// Minimum seconds between fetches of any one move sheet.
    pub secondary_refresh_secs: u64,
    pub fetch_timeout_secs: u64,
    pub redirect_timeout_secs: u64,
    pub delimiter: char,
    /// Keep the last good snapshots on disk.
    pub persist: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sheet_url: DEFAULT_SHEET_URL.to_string(),
            primary_refresh_secs: 300,
            secondary_refresh_secs: 900,
            fetch_timeout_secs: 30,
            redirect_timeout_secs: 10,
            delimiter: ',',
            persist: false,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Ok(path) => Self::load_from(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `SHEETDEX_*` overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_SHEET_URL) {
            self.sheet_url = url;
        }
        let secs = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|v| {
                    v.trim()
                        .parse::<u64>()
                        .with_context(|| format!("{} must be a whole number of seconds", key))
                })
                .transpose()
        };
        if let Some(v) = secs(ENV_PRIMARY_REFRESH_SECS)? {
            self.primary_refresh_secs = v;
        }
        if let Some(v) = secs(ENV_SECONDARY_REFRESH_SECS)? {
            self.secondary_refresh_secs = v;
        }
        if let Some(v) = secs(ENV_FETCH_TIMEOUT_SECS)? {
            self.fetch_timeout_secs = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheet_url.trim().is_empty() {
            anyhow::bail!("sheet_url must not be empty");
        }
        if !self.delimiter.is_ascii() {
            anyhow::bail!("delimiter must be a single ASCII character");
        }
        if self.fetch_timeout_secs == 0 || self.redirect_timeout_secs == 0 {
            anyhow::bail!("timeouts must be at least one second");
        }
        Ok(())
    }

    pub fn primary_freshness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.primary_refresh_secs as i64)
    }

    pub fn secondary_freshness(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.secondary_refresh_secs as i64)
    }

    pub fn fetch_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn redirect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.redirect_timeout_secs)
    }

    /// Delimiter as a byte; non-ASCII falls back to a comma.
    pub fn delimiter_byte(&self) -> u8 {
        if self.delimiter.is_ascii() {
            self.delimiter as u8
        } else {
            b','
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
