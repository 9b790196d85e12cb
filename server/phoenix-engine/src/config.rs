//! Engine configuration with sane defaults.

use std::path::Path;

use serde::Deserialize;

use crate::error::EngineError;

/// Largest seconds value chrono can hold as a millisecond-backed duration.
const MAX_DURATION_SECS: u64 = i64::MAX as u64 / 1000;

/// Tunable thresholds for baseline learning, correlation and escalation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Samples required before a baseline is trusted.
  pub min_samples: u64,
  /// Deviation score at or above which a reading is `strong`.
  pub z_threshold: f64,
  /// Deviation score at or above which a reading is `mild`.
  pub mild_threshold: f64,
  /// Seconds a recorded deviation stays eligible for correlation.
  pub time_window_secs: u64,
  /// Seconds after an incident during which all escalation is suppressed.
  pub cooldown_secs: u64,
  /// Minimum confidence (0..1) for a group to escalate.
  pub min_confidence: f64,
  /// Drop expired deviations after each correlation pass.
  pub evict_expired: bool,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      min_samples: 30,
      z_threshold: 3.0,
      mild_threshold: 2.0,
      time_window_secs: 30,
      cooldown_secs: 300,
      min_confidence: 0.7,
      evict_expired: false,
    }
  }
}

impl Config {
  /// Parse a TOML document; missing keys fall back to defaults.
  pub fn from_toml_str(s: &str) -> Result<Self, EngineError> {
    let config: Config = toml::from_str(s)?;
    config.validate()?;
    Ok(config)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
      .map_err(|e| EngineError::config(format!("cannot read {}: {}", path.display(), e)))?;
    Self::from_toml_str(&raw)
  }

  pub fn validate(&self) -> Result<(), EngineError> {
    // Sample variance divides by (count - 1).
    if self.min_samples < 2 {
      return Err(EngineError::config("min_samples must be at least 2"));
    }
    if !(self.mild_threshold > 0.0) {
      return Err(EngineError::config("mild_threshold must be positive"));
    }
    if self.z_threshold < self.mild_threshold {
      return Err(EngineError::config(
        "z_threshold must be greater than or equal to mild_threshold",
      ));
    }
    if self.time_window_secs == 0 {
      return Err(EngineError::config("time_window_secs must be positive"));
    }
    if self.time_window_secs > MAX_DURATION_SECS {
      return Err(EngineError::config("time_window_secs is out of range"));
    }
    if self.cooldown_secs > MAX_DURATION_SECS {
      return Err(EngineError::config("cooldown_secs is out of range"));
    }
    if !(0.0..=1.0).contains(&self.min_confidence) {
      return Err(EngineError::config("min_confidence must be within [0, 1]"));
    }
    Ok(())
  }

  pub fn time_window(&self) -> Result<chrono::Duration, EngineError> {
    duration_secs("time_window_secs", self.time_window_secs)
  }

  pub fn cooldown(&self) -> Result<chrono::Duration, EngineError> {
    duration_secs("cooldown_secs", self.cooldown_secs)
  }
}

fn duration_secs(field: &str, secs: u64) -> Result<chrono::Duration, EngineError> {
  i64::try_from(secs)
    .ok()
    .and_then(chrono::Duration::try_seconds)
    .ok_or_else(|| EngineError::config(format!("{} is out of range", field)))
}
