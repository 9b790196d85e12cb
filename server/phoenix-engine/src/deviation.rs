//! Score one reading against its learned baseline.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::baseline::BaselineLearner;
use crate::types::{Deviation, DeviationLevel};

#[derive(Debug, Clone, Copy)]
pub struct DeviationDetector {
  z_threshold: f64,
  mild_threshold: f64,
}

impl Default for DeviationDetector {
  fn default() -> Self {
    Self::new(3.0, 2.0)
  }
}

impl DeviationDetector {
  pub fn new(z_threshold: f64, mild_threshold: f64) -> Self {
    Self {
      z_threshold,
      mild_threshold,
    }
  }

  /// Returns `None` until the baseline is ready, and for flat (zero variance) signals.
  pub fn evaluate(
    &self,
    baselines: &BaselineLearner,
    component: &str,
    metric: &str,
    value: f64,
    at: DateTime<Utc>,
  ) -> Option<Deviation> {
    if !baselines.is_ready(component, metric) {
      return None;
    }
    let (mean, std_dev) = baselines.get_baseline(component, metric).ok()?;
    if std_dev == 0.0 {
      return None;
    }

    let score = (value - mean).abs() / std_dev;
    let level = self.classify(score);
    if level == DeviationLevel::Strong {
      debug!(component, metric, value, score, "strong deviation");
    }

    Some(Deviation {
      component: component.to_string(),
      metric: metric.to_string(),
      value,
      mean: round3(mean),
      std_dev: round3(std_dev),
      deviation_score: round3(score),
      level,
      timestamp: at,
    })
  }

  /// First match wins: strong, then mild, else normal.
  pub fn classify(&self, score: f64) -> DeviationLevel {
    if score >= self.z_threshold {
      DeviationLevel::Strong
    } else if score >= self.mild_threshold {
      DeviationLevel::Mild
    } else {
      DeviationLevel::Normal
    }
  }
}

fn round3(x: f64) -> f64 {
  (x * 1000.0).round() / 1000.0
}
