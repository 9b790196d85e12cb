//! Normalize inbound observations into canonical internal readings.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::EngineError;
use crate::types::{Observation, Reading};

/// Validate and normalize an Observation into a Reading.
pub fn normalize(raw: &Observation) -> Result<Reading, EngineError> {
  let component = raw.component.trim();
  if component.is_empty() {
    return Err(EngineError::validation("component", "must not be empty"));
  }
  let metric = raw.metric.trim();
  if metric.is_empty() {
    return Err(EngineError::validation("metric", "must not be empty"));
  }

  // NaN/inf would poison the running statistics for the whole signal.
  if !raw.value.is_finite() {
    return Err(EngineError::validation("value", "must be a finite number"));
  }

  let observed_at = match &raw.timestamp {
    Some(ts) => Some(parse_timestamp(ts)?),
    None => None,
  };

  Ok(Reading {
    component: component.to_string(),
    metric: metric.to_string(),
    value: raw.value,
    observed_at,
  })
}

/// RFC3339, or a naive ISO-8601 datetime taken as UTC.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, EngineError> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Ok(dt.with_timezone(&Utc));
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .map(|naive| naive.and_utc())
    .map_err(|e| EngineError::validation("timestamp", &format!("invalid ISO-8601: {}", e)))
}
