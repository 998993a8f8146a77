//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! service base URL, the clock style used for timestamps and the alert
//! auto-hide delay.
//!
//! Configuration is stored at `~/.config/calcdesk/config.json`. Front ends
//! read `CALCDESK_BASE_URL` to override the stored base URL for one run.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Application name used for config/data directory paths
const APP_NAME: &str = "calcdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding `base_url`
pub const BASE_URL_ENV: &str = "CALCDESK_BASE_URL";

/// Service address used when nothing is configured
const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Seconds an alert stays visible before it starts fading out
pub const DEFAULT_ALERT_TIMEOUT_SECS: u64 = 5;

/// How hours are rendered in formatted times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockStyle {
    /// "02:30 PM"
    #[default]
    TwelveHour,
    /// "14:30"
    TwentyFourHour,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub clock_style: ClockStyle,
    pub alert_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            clock_style: ClockStyle::default(),
            alert_timeout_secs: DEFAULT_ALERT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load the config file, or defaults when there is none.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            let config: Config =
                serde_json::from_str(&contents).context("Failed to parse config file")?;
            debug!(path = %path.display(), "Loaded config");
            config
        } else {
            Self::default()
        };

        config.base_url = config.base_url.trim_end_matches('/').to_string();

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn alert_timeout(&self) -> Duration {
        Duration::from_secs(self.alert_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory holding the persisted session store.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{"clock_style": "twenty_four_hour"}"#)
            .expect("Failed to parse partial config");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.clock_style, ClockStyle::TwentyFourHour);
        assert_eq!(config.alert_timeout(), Duration::from_secs(5));
    }
}
