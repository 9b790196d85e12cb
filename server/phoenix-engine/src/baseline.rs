//! Streaming per-signal baselines: Welford running mean and sample variance.
//!
//! Every distinct `(component, metric)` pair keeps a record for the lifetime of
//! the learner; records are never pruned.

use std::collections::HashMap;

use tracing::debug;

use crate::error::EngineError;
use crate::types::{BaselineRecord, SignalKey};

#[derive(Debug, Clone)]
pub struct BaselineLearner {
  min_samples: u64,
  stats: HashMap<SignalKey, BaselineRecord>,
}

impl BaselineLearner {
  pub fn new(min_samples: u64) -> Self {
    Self {
      min_samples,
      stats: HashMap::new(),
    }
  }

  pub fn min_samples(&self) -> u64 {
    self.min_samples
  }

  /// Fold one value into the signal's running statistics.
  pub fn update(&mut self, component: &str, metric: &str, value: f64) {
    let record = self
      .stats
      .entry(SignalKey::new(component, metric))
      .or_default();
    welford_step(record, value);

    if record.count == self.min_samples {
      debug!(component, metric, mean = record.mean, "baseline ready");
    }
  }

  pub fn is_ready(&self, component: &str, metric: &str) -> bool {
    self.count(component, metric) >= self.min_samples
  }

  /// Returns `(mean, std_dev)` using the Bessel-corrected sample variance.
  pub fn get_baseline(&self, component: &str, metric: &str) -> Result<(f64, f64), EngineError> {
    let record = self.record(component, metric).copied().unwrap_or_default();
    if record.count < self.min_samples {
      return Err(EngineError::NotReady {
        component: component.to_string(),
        metric: metric.to_string(),
        have: record.count,
        needed: self.min_samples,
      });
    }

    let variance = record.m2 / (record.count - 1) as f64;
    Ok((record.mean, variance.sqrt()))
  }

  pub fn record(&self, component: &str, metric: &str) -> Option<&BaselineRecord> {
    self.stats.get(&SignalKey::new(component, metric))
  }

  pub fn count(&self, component: &str, metric: &str) -> u64 {
    self.record(component, metric).map_or(0, |r| r.count)
  }

  /// Number of signals tracked so far.
  pub fn len(&self) -> usize {
    self.stats.len()
  }

  pub fn is_empty(&self) -> bool {
    self.stats.is_empty()
  }
}

/// One Welford recurrence step.
fn welford_step(record: &mut BaselineRecord, value: f64) {
  record.count += 1;
  let delta = value - record.mean;
  record.mean += delta / record.count as f64;
  let delta2 = value - record.mean;
  record.m2 += delta * delta2;
}
