//! Structured error types for the decision engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  #[error("baseline not ready for {component}/{metric}: have {have} samples, need {needed}")]
  NotReady {
    component: String,
    metric: String,
    have: u64,
    needed: u64,
  },

  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("topology: {0}")]
  Topology(String),

  #[error("config: {0}")]
  Config(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),

  #[error("toml: {0}")]
  Toml(#[from] toml::de::Error),
}

impl EngineError {
  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn topology(msg: impl Into<String>) -> Self {
    Self::Topology(msg.into())
  }

  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }
}
