//! Analyser configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default name of the timestamp column in CSV logs.
pub const DEFAULT_TIMESTAMP_COLUMN: &str = "timestamp";

/// Settings that shape how logs are read and how the window is observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyserConfig {
    /// Header name of the column holding row timestamps.
    pub timestamp_column: String,
    /// Multiplier applied to every parsed timestamp (unit conversion).
    pub timestamp_scale: f64,
    /// Window length above which a warning is logged.
    ///
    /// The window is never truncated; this only surfaces constraint sets that
    /// leave many stimuli unresolved.
    pub window_warn_threshold: usize,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            timestamp_column: DEFAULT_TIMESTAMP_COLUMN.to_string(),
            timestamp_scale: 1.0,
            window_warn_threshold: 10_000,
        }
    }
}

impl AnalyserConfig {
    /// Parse a JSON configuration document; missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validate configuration.
    ///
    /// This must be called before constructing a log source from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timestamp_column.trim().is_empty() {
            return Err(ConfigError::EmptyTimestampColumn);
        }
        if !self.timestamp_scale.is_finite() || self.timestamp_scale <= 0.0 {
            return Err(ConfigError::InvalidScale {
                value: self.timestamp_scale,
            });
        }
        Ok(())
    }
}
