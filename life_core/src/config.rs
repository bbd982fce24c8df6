// config.rs - Simulation settings, loadable from JSON

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::grid::{GridError, DEFAULT_SIZE};
use crate::patterns::Pattern;

/// Largest board edge a config may ask for.
pub const MAX_SIZE: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
    #[error("unknown pattern: {0}")]
    UnknownPattern(String),
    #[error("pattern {pattern} does not fit a {size}x{size} grid")]
    PatternTooLarge { pattern: String, size: usize },
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Durations are in milliseconds. A `tick_interval_ms` of 0 runs
/// generations back to back with no pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LifeConfig {
    pub size: usize,
    pub warm_up_ms: u64,
    pub tick_interval_ms: u64,
    pub display_timeout_ms: u64,
    pub initial_pattern: String,
}

impl Default for LifeConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            warm_up_ms: 1000,
            tick_interval_ms: 200,
            display_timeout_ms: 5000,
            initial_pattern: "Initial".to_owned(),
        }
    }
}

impl LifeConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size == 0 {
            return Err(ConfigError::Invalid("size must be at least 1"));
        }
        if self.size > MAX_SIZE {
            return Err(ConfigError::Invalid("size must be at most 1024"));
        }
        if self.display_timeout_ms == 0 {
            return Err(ConfigError::Invalid("display_timeout_ms must be positive"));
        }
        let pattern = self.pattern()?;
        if !pattern.fits(self.size) {
            return Err(ConfigError::PatternTooLarge {
                pattern: pattern.name.to_owned(),
                size: self.size,
            });
        }
        Ok(())
    }

    pub fn pattern(&self) -> Result<&'static Pattern, ConfigError> {
        Pattern::by_name(&self.initial_pattern)
            .ok_or_else(|| ConfigError::UnknownPattern(self.initial_pattern.clone()))
    }

    pub fn warm_up(&self) -> Duration {
        Duration::from_millis(self.warm_up_ms)
    }

    /// `None` when generations should run unpaced.
    pub fn tick_interval(&self) -> Option<Duration> {
        (self.tick_interval_ms > 0).then(|| Duration::from_millis(self.tick_interval_ms))
    }

    pub fn display_timeout(&self) -> Duration {
        Duration::from_millis(self.display_timeout_ms)
    }
}
