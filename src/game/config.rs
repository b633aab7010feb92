//! Round Configuration
//!
//! Tunables for one round. Defaults are the live game balance; a JSON file may
//! override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::timer::Millis;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid JSON for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// Values are inconsistent.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Spawn scheduler and object generator tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Spawner cadence
    pub period_ms: Millis,
    /// Field capacity; spawning stops at this many active objects
    pub max_active_objects: usize,
    /// At or below this many seconds remaining the spawner ramps up
    pub ramp_seconds: u32,
    /// Chance of a double spawn before the ramp
    pub double_chance_early: f64,
    /// Chance of a double spawn after the ramp
    pub double_chance_late: f64,
    /// Kind draw above this is Freeze
    pub freeze_threshold: f64,
    /// Kind draw above this (and not Freeze) is Hazard
    pub hazard_threshold: f64,
    /// Leftmost horizontal position (percent)
    pub min_x: u8,
    /// Rightmost horizontal position (percent, inclusive)
    pub max_x: u8,
    /// Shortest fall
    pub min_fall_secs: f64,
    /// Longest fall (exclusive)
    pub max_fall_secs: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            period_ms: 550,
            max_active_objects: crate::MAX_ACTIVE_OBJECTS,
            ramp_seconds: 15,
            double_chance_early: 0.5,
            double_chance_late: 0.7,
            freeze_threshold: 0.94,
            hazard_threshold: 0.78,
            min_x: 10,
            max_x: 90,
            min_fall_secs: 2.0,
            max_fall_secs: 4.0,
        }
    }
}

/// Points per hit kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Added for a Fruit hit
    pub fruit_points: u32,
    /// Subtracted for a Hazard hit (score floors at 0)
    pub hazard_penalty: u32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            fruit_points: 10,
            hazard_penalty: 5,
        }
    }
}

/// Configuration for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Round length in clock ticks
    pub round_seconds: u32,
    /// Round clock cadence
    pub clock_period_ms: Millis,
    /// Freeze window length
    pub freeze_ms: Millis,
    /// Lifetime of a score pop
    pub score_effect_ms: Millis,
    /// Screen shake after a hazard hit
    pub shake_ms: Millis,
    /// Spawner / generator
    pub spawn: SpawnConfig,
    /// Scoring
    pub scoring: ScoringConfig,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            round_seconds: crate::ROUND_SECONDS,
            clock_period_ms: 1000,
            freeze_ms: 2000,
            score_effect_ms: 600,
            shake_ms: 500,
            spawn: SpawnConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl RoundConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RoundConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let spawn = &self.spawn;

        if self.round_seconds == 0 {
            return Err(ConfigError::Invalid("round_seconds must be positive".into()));
        }
        if self.clock_period_ms == 0 || spawn.period_ms == 0 {
            return Err(ConfigError::Invalid("timer periods must be positive".into()));
        }
        if spawn.max_active_objects == 0 {
            return Err(ConfigError::Invalid("max_active_objects must be positive".into()));
        }
        if !(0.0..=1.0).contains(&spawn.hazard_threshold)
            || !(0.0..=1.0).contains(&spawn.freeze_threshold)
            || spawn.hazard_threshold > spawn.freeze_threshold
        {
            return Err(ConfigError::Invalid(format!(
                "kind thresholds must satisfy 0 <= hazard ({}) <= freeze ({}) <= 1",
                spawn.hazard_threshold, spawn.freeze_threshold
            )));
        }
        for chance in [spawn.double_chance_early, spawn.double_chance_late] {
            if !(0.0..=1.0).contains(&chance) {
                let message = format!("double spawn chance {chance} out of [0, 1]");
                return Err(ConfigError::Invalid(message));
            }
        }
        if spawn.min_x > spawn.max_x || spawn.max_x > 100 {
            return Err(ConfigError::Invalid("horizontal range must lie within 0..=100".into()));
        }
        if !(spawn.min_fall_secs > 0.0 && spawn.min_fall_secs < spawn.max_fall_secs) {
            return Err(ConfigError::Invalid("fall range must be positive and non-empty".into()));
        }

        Ok(())
    }
}
