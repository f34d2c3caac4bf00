//! pairsync configuration file parsing (.pairsync.toml)

use std::path::Path;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Config file name, looked up at the synchronized root
pub const CONFIG_FILE: &str = ".pairsync.toml";

/// pairsync project configuration
#[derive(Debug, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watch debounce window in milliseconds
    pub debounce_ms: u64,

    /// Total attempts per disk operation, including the first
    pub retry_attempts: u32,

    /// Fixed pause between retry attempts in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            retry_attempts: 10,
            retry_delay_ms: 100,
        }
    }
}

impl Config {
    /// Load config from the synchronized root.
    ///
    /// Returns default config if .pairsync.toml doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(root: &Path) -> color_eyre::Result<Self> {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Retry budget for every disk operation.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            delay: Duration::from_millis(self.retry_delay_ms),
        }
    }

    /// Debounce window for the directory watcher.
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
