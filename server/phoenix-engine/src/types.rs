//! Core types for the decision engine (JSON contracts + internal models).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Inbound types (JSON contract — what the signal source sends)
// ---------------------------------------------------------------------------

/// One telemetry observation line from stdin. Unknown fields are silently ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Observation {
  pub component: String,
  pub metric: String,
  pub value: f64,
  /// Emission time reported by the source. Informational only.
  #[serde(default)]
  pub timestamp: Option<String>,
}

impl Observation {
  pub fn new(component: impl Into<String>, metric: impl Into<String>, value: f64) -> Self {
    Self {
      component: component.into(),
      metric: metric.into(),
      value,
      timestamp: None,
    }
  }
}

/// Canonical internal observation after normalization + validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
  pub component: String,
  pub metric: String,
  pub value: f64,
  pub observed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Signal identity + running statistics
// ---------------------------------------------------------------------------

/// Identity of one time series: `(component, metric)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SignalKey {
  pub component: String,
  pub metric: String,
}

impl SignalKey {
  pub fn new(component: &str, metric: &str) -> Self {
    Self {
      component: component.to_string(),
      metric: metric.to_string(),
    }
  }
}

/// Welford running state for one signal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BaselineRecord {
  pub count: u64,
  pub mean: f64,
  /// Sum of squared differences from the running mean.
  pub m2: f64,
}

// ---------------------------------------------------------------------------
// Deviations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviationLevel {
  Normal,
  Mild,
  Strong,
}

/// A scored departure of an observed value from its baseline.
///
/// `mean`, `std_dev` and `deviation_score` are rounded to 3 decimals for display;
/// `level` was decided on the unrounded score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Deviation {
  pub component: String,
  pub metric: String,
  pub value: f64,
  pub mean: f64,
  pub std_dev: f64,
  pub deviation_score: f64,
  pub level: DeviationLevel,
  /// Evaluation time, replaced by the record time once buffered for correlation.
  pub timestamp: DateTime<Utc>,
}

/// Deviations linked by downstream reachability inside the correlation window.
pub type CorrelationGroup = Vec<Deviation>;

/// Distinct components spanned by a group, sorted.
pub fn group_components(group: &[Deviation]) -> BTreeSet<String> {
  group.iter().map(|d| d.component.clone()).collect()
}

// ---------------------------------------------------------------------------
// Output types (JSON contract — what we emit)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Medium,
  High,
}

#[derive(Debug, Clone, Serialize)]
pub struct Incident {
  pub incident_id: String,
  pub timestamp: DateTime<Utc>,
  pub severity: Severity,
  pub confidence: f64,
  pub affected_components: BTreeSet<String>,
  pub critical_involved: bool,
  pub summary: String,
  /// The full correlation group, kept as an audit trail.
  pub details: CorrelationGroup,
}

// ---------------------------------------------------------------------------
// CLI stream wrappers
// ---------------------------------------------------------------------------

/// Structured error output for invalid input lines.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
