//! Escalation: decide whether a correlation group becomes an incident.
//!
//! Confidence = 0.5 + 0.2 per strong deviation + 0.2 when a critical
//! component is involved, capped at 1.0. A single global cooldown follows
//! every raised incident.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::Clock;
use crate::topology::Topology;
use crate::types::{group_components, Deviation, DeviationLevel, Incident, Severity};

const BASE_CONFIDENCE: f64 = 0.5;
const STRONG_DEVIATION_WEIGHT: f64 = 0.2;
const CRITICAL_BONUS: f64 = 0.2;
const SUMMARY: &str = "Correlated system degradation detected";

pub struct IncidentManager {
  critical_components: HashSet<String>,
  cooldown: Duration,
  min_confidence: f64,
  clock: Arc<dyn Clock>,
  last_incident_time: Option<DateTime<Utc>>,
}

impl IncidentManager {
  pub fn new(
    topology: &Topology,
    cooldown: Duration,
    min_confidence: f64,
    clock: Arc<dyn Clock>,
  ) -> Self {
    Self {
      critical_components: topology.critical_components(),
      cooldown,
      min_confidence,
      clock,
      last_incident_time: None,
    }
  }

  /// Returns `Some(incident)` when the group justifies escalation.
  pub fn evaluate(&mut self, group: &[Deviation]) -> Option<Incident> {
    let now = self.clock.now();

    if self.in_cooldown(now) {
      debug!("incident suppressed by cooldown");
      return None;
    }

    let components = group_components(group);
    if components.len() < 2 {
      return None;
    }

    let strong = group
      .iter()
      .filter(|d| d.level == DeviationLevel::Strong)
      .count();
    if strong == 0 {
      return None;
    }

    let critical_involved = components
      .iter()
      .any(|c| self.critical_components.contains(c));

    let confidence = confidence(strong, critical_involved);
    if confidence < self.min_confidence {
      return None;
    }

    self.last_incident_time = Some(now);

    let severity = if critical_involved {
      Severity::High
    } else {
      Severity::Medium
    };
    let incident_id = format!("INC-{}", Uuid::new_v4().simple());

    info!(
      %incident_id,
      ?severity,
      confidence,
      components = ?components,
      "incident raised"
    );

    Some(Incident {
      incident_id,
      timestamp: now,
      severity,
      confidence: (confidence * 100.0).round() / 100.0,
      affected_components: components,
      critical_involved,
      summary: SUMMARY.to_string(),
      details: group.to_vec(),
    })
  }

  fn in_cooldown(&self, now: DateTime<Utc>) -> bool {
    self
      .last_incident_time
      .is_some_and(|last| now - last < self.cooldown)
  }

  pub fn last_incident_time(&self) -> Option<DateTime<Utc>> {
    self.last_incident_time
  }

  pub fn critical_components(&self) -> &HashSet<String> {
    &self.critical_components
  }
}

pub fn confidence(strong_deviations: usize, critical_involved: bool) -> f64 {
  let critical = if critical_involved { CRITICAL_BONUS } else { 0.0 };
  (BASE_CONFIDENCE + STRONG_DEVIATION_WEIGHT * strong_deviations as f64 + critical).min(1.0)
}
