//! Consolidation run configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default bound on a single store call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Consolidation run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidateConfig {
    /// SQLite database file.
    pub database_path: PathBuf,

    /// Deadline for every individual store call.
    pub call_timeout: Duration,

    /// Report the planned merges without mutating anything.
    pub dry_run: bool,
}

impl Default for ConsolidateConfig {
    fn default() -> Self {
        ConsolidateConfig {
            database_path: PathBuf::from("./medstock.db"),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            dry_run: false,
        }
    }
}

impl ConsolidateConfig {
    /// Load configuration from environment variables.
    ///
    /// - `MEDSTOCK_DB_PATH` (default `./medstock.db`)
    /// - `MEDSTOCK_CALL_TIMEOUT_SECS` (default 10, must be > 0)
    /// - `MEDSTOCK_DRY_RUN` (`1`/`true` enables)
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = ConsolidateConfig::default();

        let database_path = env::var("MEDSTOCK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.database_path);

        let call_timeout = match env::var("MEDSTOCK_CALL_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("MEDSTOCK_CALL_TIMEOUT_SECS".to_string()))?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue(
                        "MEDSTOCK_CALL_TIMEOUT_SECS".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            Err(_) => defaults.call_timeout,
        };

        let dry_run = env::var("MEDSTOCK_DRY_RUN")
            .map(|raw| parse_flag(&raw))
            .unwrap_or(false);

        Ok(ConsolidateConfig {
            database_path,
            call_timeout,
            dry_run,
        })
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
