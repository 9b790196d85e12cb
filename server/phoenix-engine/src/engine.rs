//! Core engine: wires the four decision stages into one pipeline.

use std::sync::Arc;

use crate::baseline::BaselineLearner;
use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::correlation::Correlator;
use crate::deviation::DeviationDetector;
use crate::error::EngineError;
use crate::incident::IncidentManager;
use crate::normalize;
use crate::topology::Topology;
use crate::types::{Incident, Observation};

/// The incident decision engine. Holds in-memory state across observations.
pub struct Engine {
  config: Config,
  clock: Arc<dyn Clock>,
  baselines: BaselineLearner,
  detector: DeviationDetector,
  correlator: Correlator,
  incidents: IncidentManager,
}

impl Engine {
  /// Validates config and topology; both are fatal at construction.
  pub fn new(config: Config, topology: &Topology, clock: Arc<dyn Clock>) -> Result<Self, EngineError> {
    config.validate()?;
    topology.validate()?;
    let time_window = config.time_window()?;
    let cooldown = config.cooldown()?;

    Ok(Self {
      baselines: BaselineLearner::new(config.min_samples),
      detector: DeviationDetector::new(config.z_threshold, config.mild_threshold),
      correlator: Correlator::new(topology, time_window, clock.clone()),
      incidents: IncidentManager::new(
        topology,
        cooldown,
        config.min_confidence,
        clock.clone(),
      ),
      config,
      clock,
    })
  }

  pub fn with_defaults(topology: &Topology) -> Result<Self, EngineError> {
    Self::new(Config::default(), topology, Arc::new(SystemClock))
  }

  /// Process a single observation.
  ///
  /// Returns every incident raised while evaluating the resulting correlation
  /// groups; usually empty.
  pub fn process(&mut self, raw: &Observation) -> Result<Vec<Incident>, EngineError> {
    let reading = normalize::normalize(raw)?;

    self
      .baselines
      .update(&reading.component, &reading.metric, reading.value);

    let deviation = match self.detector.evaluate(
      &self.baselines,
      &reading.component,
      &reading.metric,
      reading.value,
      self.clock.now(),
    ) {
      Some(d) => d,
      None => return Ok(Vec::new()),
    };

    self.correlator.record_deviation(deviation);
    let groups = self.correlator.correlate();
    if self.config.evict_expired {
      self.correlator.evict_expired();
    }

    Ok(
      groups
        .iter()
        .filter_map(|group| self.incidents.evaluate(group))
        .collect(),
    )
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn baselines(&self) -> &BaselineLearner {
    &self.baselines
  }

  pub fn correlator(&self) -> &Correlator {
    &self.correlator
  }

  pub fn incident_manager(&self) -> &IncidentManager {
    &self.incidents
  }
}
