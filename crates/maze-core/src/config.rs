//! Configuration loading and typed config structures for the maze robot
//! simulator.
//!
//! The configuration lives in `maze-config.yaml`. This module defines
//! strongly-typed structs that mirror the YAML structure, a loader that reads
//! the file, environment overrides, and validation.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! usable configuration.

use std::path::Path;

use maze_world::{MIN_SUPPORTED_SIDE_LENGTH, SizeBounds};
use serde::Deserialize;
use tracing::warn;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but are inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulator configuration.
///
/// Mirrors the structure of `maze-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Grid size bounds and generation pacing.
    #[serde(default)]
    pub maze: MazeConfig,

    /// Stepping speed and run limits.
    #[serde(default)]
    pub simulation: SpeedConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Random seed for reproducible runs. `None` draws one from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `MAZE_SIDE_LENGTH` overrides `maze.default_side_length`
    /// - `MAZE_SEED` overrides `seed`
    /// - `MAZE_SPEED_PERCENT` overrides `simulation.speed_percent`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides,
    /// and validate.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply `MAZE_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unparseable values are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("MAZE_SIDE_LENGTH") {
            match val.parse() {
                Ok(side) => self.maze.default_side_length = side,
                Err(e) => warn!(value = val, error = %e, "ignoring MAZE_SIDE_LENGTH"),
            }
        }
        if let Some(val) = lookup("MAZE_SEED") {
            match val.parse() {
                Ok(seed) => self.seed = Some(seed),
                Err(e) => warn!(value = val, error = %e, "ignoring MAZE_SEED"),
            }
        }
        if let Some(val) = lookup("MAZE_SPEED_PERCENT") {
            match val.parse() {
                Ok(speed) => self.simulation.speed_percent = speed,
                Err(e) => warn!(value = val, error = %e, "ignoring MAZE_SPEED_PERCENT"),
            }
        }
    }

    /// Check cross-field consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let maze = &self.maze;
        if maze.min_side_length > maze.max_side_length {
            return Err(invalid(format!(
                "maze.min_side_length {} exceeds maze.max_side_length {}",
                maze.min_side_length, maze.max_side_length
            )));
        }
        if maze.min_side_length < MIN_SUPPORTED_SIDE_LENGTH {
            return Err(invalid(format!(
                "maze.min_side_length must be at least {MIN_SUPPORTED_SIDE_LENGTH}"
            )));
        }
        if maze.min_side_length.is_multiple_of(2) || maze.max_side_length.is_multiple_of(2) {
            return Err(invalid("maze side length bounds must be odd".to_owned()));
        }
        maze.bounds()
            .validate(maze.default_side_length)
            .map_err(|e| invalid(format!("maze.default_side_length: {e}")))?;

        let sim = &self.simulation;
        if sim.min_step_interval_ms > sim.max_step_interval_ms {
            return Err(invalid(format!(
                "simulation.min_step_interval_ms {} exceeds simulation.max_step_interval_ms {}",
                sim.min_step_interval_ms, sim.max_step_interval_ms
            )));
        }
        if sim.speed_percent > MAX_SPEED_PERCENT {
            return Err(invalid(format!(
                "simulation.speed_percent {} exceeds {MAX_SPEED_PERCENT}",
                sim.speed_percent
            )));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

/// Maze size and generation configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MazeConfig {
    /// Side length used when none is requested explicitly. Counts every
    /// cell, boundary walls included.
    #[serde(default = "default_side_length")]
    pub default_side_length: usize,

    /// Smallest side length a caller may request.
    #[serde(default = "default_min_side_length")]
    pub min_side_length: usize,

    /// Largest side length a caller may request.
    #[serde(default = "default_max_side_length")]
    pub max_side_length: usize,

    /// Pause between generation iterations, in milliseconds. Zero yields to
    /// the runtime without sleeping.
    #[serde(default = "default_generation_delay_ms")]
    pub generation_delay_ms: u64,
}

impl MazeConfig {
    /// The configured side length bounds.
    pub const fn bounds(&self) -> SizeBounds {
        SizeBounds::new(self.min_side_length, self.max_side_length)
    }
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            default_side_length: default_side_length(),
            min_side_length: default_min_side_length(),
            max_side_length: default_max_side_length(),
            generation_delay_ms: default_generation_delay_ms(),
        }
    }
}

/// Highest accepted `speed_percent`.
pub const MAX_SPEED_PERCENT: u64 = 100;

/// Stepping speed and run limits.
///
/// The scheduler derives its step interval from `speed_percent`: 0 runs at
/// `max_step_interval_ms`, 100 at `min_step_interval_ms`, linear between.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SpeedConfig {
    /// Simulation speed, 0 (slowest) to 100 (fastest).
    #[serde(default)]
    pub speed_percent: u64,

    /// Step interval at full speed.
    #[serde(default = "default_min_step_interval_ms")]
    pub min_step_interval_ms: u64,

    /// Step interval at zero speed.
    #[serde(default = "default_max_step_interval_ms")]
    pub max_step_interval_ms: u64,

    /// Maximum number of steps before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_steps: u64,

    /// Maximum wall-clock seconds of stepping before the run ends
    /// (0 = unlimited). Generation time is not counted.
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl SpeedConfig {
    /// Step interval for the configured speed.
    pub fn step_interval_ms(&self) -> u64 {
        self.interval_for_speed(self.speed_percent)
    }

    /// Step interval for an arbitrary speed, clamped to `0..=100`.
    pub fn interval_for_speed(&self, speed_percent: u64) -> u64 {
        interval_for_speed(
            self.min_step_interval_ms,
            self.max_step_interval_ms,
            speed_percent,
        )
    }
}

/// Map a speed percentage onto `[min_ms, max_ms]`: 0 gives `max_ms`, 100
/// gives `min_ms`. Speeds above 100 are clamped.
pub fn interval_for_speed(min_ms: u64, max_ms: u64, speed_percent: u64) -> u64 {
    let speed = speed_percent.min(MAX_SPEED_PERCENT);
    let reduction = max_ms
        .saturating_sub(min_ms)
        .saturating_mul(speed)
        .checked_div(MAX_SPEED_PERCENT)
        .unwrap_or(0);
    max_ms.saturating_sub(reduction)
}

impl Default for SpeedConfig {
    fn default() -> Self {
        Self {
            speed_percent: 0,
            min_step_interval_ms: default_min_step_interval_ms(),
            max_step_interval_ms: default_max_step_interval_ms(),
            max_steps: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_side_length() -> usize {
    49
}

const fn default_min_side_length() -> usize {
    MIN_SUPPORTED_SIDE_LENGTH
}

const fn default_max_side_length() -> usize {
    101
}

const fn default_generation_delay_ms() -> u64 {
    1
}

const fn default_min_step_interval_ms() -> u64 {
    50
}

const fn default_max_step_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_owned()
}
