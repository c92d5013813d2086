//! Level catalog and game configuration.

use crate::grid::{DEFAULT_BROKEN_PROBABILITY, MIN_GRID_SIZE};
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Immutable parameters of one level.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct LevelConfig {
    /// 1-based level number.
    level: usize,

    /// Side length of the square grid.
    grid_size: usize,

    /// Countdown length in seconds.
    time_limit_secs: u32,

    /// Points for a completion inside the full-points window.
    base_points: u32,

    /// Display title.
    title: String,

    /// Display description.
    #[serde(default)]
    description: String,
}

impl LevelConfig {
    /// Creates a level configuration.
    #[instrument(skip(title, description))]
    pub fn new(
        level: usize,
        grid_size: usize,
        time_limit_secs: u32,
        base_points: u32,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            level,
            grid_size,
            time_limit_secs,
            base_points,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Game-wide configuration: the level catalog and generation parameters.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// Probability that a generated cell is a broken pipe.
    #[serde(default = "default_broken_probability")]
    broken_probability: f64,

    /// Fixed RNG seed; a fresh seed is drawn per session when absent.
    #[serde(default)]
    seed: Option<u64>,

    /// Levels in play order.
    #[serde(default = "builtin_levels")]
    levels: Vec<LevelConfig>,
}

fn default_broken_probability() -> f64 {
    DEFAULT_BROKEN_PROBABILITY
}

/// The three stock levels.
#[instrument]
pub fn builtin_levels() -> Vec<LevelConfig> {
    vec![
        LevelConfig::new(
            1,
            5,
            120,
            100,
            "Beginner Plumber",
            "Fix the Water Pipes (5×5 Grid)",
        ),
        LevelConfig::new(
            2,
            6,
            120,
            200,
            "Advanced Pipeline",
            "Connect the Complex System (6×6 Grid)",
        ),
        LevelConfig::new(
            3,
            7,
            120,
            500,
            "Master Plumber",
            "Ultimate Challenge (7×7 Grid)",
        ),
    ]
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            broken_probability: default_broken_probability(),
            seed: None,
            levels: builtin_levels(),
        }
    }
}

impl GameConfig {
    /// Creates a configuration from explicit parts and validates it.
    #[instrument(skip(levels), fields(level_count = levels.len()))]
    pub fn new(
        broken_probability: f64,
        seed: Option<u64>,
        levels: Vec<LevelConfig>,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            broken_probability,
            seed,
            levels,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(levels = config.levels.len(), "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Returns a copy with the seed replaced.
    #[instrument(skip(self))]
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Looks up a level by number.
    #[instrument(skip(self))]
    pub fn level(&self, number: usize) -> Option<&LevelConfig> {
        self.levels.iter().find(|level| level.level == number)
    }

    /// The level following `number` in play order.
    #[instrument(skip(self))]
    pub fn next_level(&self, number: usize) -> Option<&LevelConfig> {
        let index = self.levels.iter().position(|level| level.level == number)?;
        self.levels.get(index + 1)
    }

    #[instrument(skip(self))]
    fn validate(&self) -> Result<(), ConfigError> {
        if self.levels.is_empty() {
            return Err(ConfigError::new("At least one level is required".to_string()));
        }
        if !(0.0..=1.0).contains(&self.broken_probability) {
            return Err(ConfigError::new(format!(
                "broken_probability must be within [0, 1], got {}",
                self.broken_probability
            )));
        }

        let mut seen = HashSet::new();
        for level in &self.levels {
            if level.grid_size < MIN_GRID_SIZE {
                return Err(ConfigError::new(format!(
                    "Level {} grid_size {} is below {}",
                    level.level, level.grid_size, MIN_GRID_SIZE
                )));
            }
            if !seen.insert(level.level) {
                return Err(ConfigError::new(format!(
                    "Level number {} appears more than once",
                    level.level
                )));
            }
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog() {
        let config = GameConfig::default();
        assert_eq!(config.levels().len(), 3);
        let sizes: Vec<_> = config.levels().iter().map(|l| *l.grid_size()).collect();
        assert_eq!(sizes, vec![5, 6, 7]);
        let points: Vec<_> = config.levels().iter().map(|l| *l.base_points()).collect();
        assert_eq!(points, vec![100, 200, 500]);
        assert!(config.levels().iter().all(|l| *l.time_limit_secs() == 120));
        assert_eq!(*config.broken_probability(), 0.10);
    }

    #[test]
    fn test_next_level_walks_catalog() {
        let config = GameConfig::default();
        assert_eq!(config.next_level(1).map(|l| *l.level()), Some(2));
        assert_eq!(config.next_level(3), None);
        assert_eq!(config.next_level(42), None);
    }

    #[test]
    fn test_rejects_empty_catalog() {
        assert!(GameConfig::new(0.1, None, Vec::new()).is_err());
    }

    #[test]
    fn test_rejects_bad_probability() {
        assert!(GameConfig::new(1.5, None, builtin_levels()).is_err());
    }

    #[test]
    fn test_error_carries_location() {
        let err = GameConfig::new(0.1, None, Vec::new()).unwrap_err();
        assert!(err.file.ends_with(".rs"));
        assert!(err.to_string().starts_with("Config error:"));
    }
}
