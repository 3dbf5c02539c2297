//! Mining and difficulty configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Initial number of leading zero hex characters.
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Desired seconds between blocks.
pub const DEFAULT_TARGET_INTERVAL_SECS: f64 = 15.0;

/// Blocks per difficulty recalibration.
pub const DEFAULT_ADJUSTMENT_WINDOW: u32 = 10;

/// Dead band around the target interval, in seconds.
pub const DEFAULT_BUFFER_SECS: f64 = 5.0;

/// Recognized options for the miner and difficulty controller.
///
/// Keys are camelCase in JSON; missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct MiningConfig {
    pub difficulty: u32,
    pub target_interval_seconds: f64,
    pub adjustment_window_blocks: u32,
    pub buffer_seconds: f64,
    /// Attempts between polls of the cancel token.
    pub cancel_check_interval: u64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        MiningConfig {
            difficulty: DEFAULT_DIFFICULTY,
            target_interval_seconds: DEFAULT_TARGET_INTERVAL_SECS,
            adjustment_window_blocks: DEFAULT_ADJUSTMENT_WINDOW,
            buffer_seconds: DEFAULT_BUFFER_SECS,
            cancel_check_interval: 1,
        }
    }
}

impl MiningConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MiningConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.difficulty == 0 {
            return Err(invalid("difficulty", "must be at least 1"));
        }
        if !self.target_interval_seconds.is_finite() || self.target_interval_seconds <= 0.0 {
            return Err(invalid("targetIntervalSeconds", "must be a positive number"));
        }
        if self.adjustment_window_blocks == 0 {
            return Err(invalid("adjustmentWindowBlocks", "must be at least 1"));
        }
        if !self.buffer_seconds.is_finite() || self.buffer_seconds < 0.0 {
            return Err(invalid("bufferSeconds", "must be a non-negative number"));
        }
        if self.cancel_check_interval == 0 {
            return Err(invalid("cancelCheckInterval", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
