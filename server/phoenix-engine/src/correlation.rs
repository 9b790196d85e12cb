//! Group recent deviations by downstream topology reachability.
//!
//! A group is seeded at a component with an active deviation and grows along
//! outgoing edges only (blast radius), transitively, whether or not the nodes
//! it passes through have deviations of their own. Upstream and unrelated
//! components are never pulled in.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use indexmap::IndexMap;
use tracing::info;

use crate::clock::Clock;
use crate::topology::{Graph, Topology};
use crate::types::{group_components, CorrelationGroup, Deviation};

pub struct Correlator {
  graph: Graph,
  time_window: Duration,
  clock: Arc<dyn Clock>,
  /// Recorded deviations per component, components in first-seen order.
  recent: IndexMap<String, Vec<Deviation>>,
}

impl Correlator {
  pub fn new(topology: &Topology, time_window: Duration, clock: Arc<dyn Clock>) -> Self {
    Self {
      graph: topology.graph(),
      time_window,
      clock,
      recent: IndexMap::new(),
    }
  }

  /// Buffer a deviation, stamped with the record time.
  pub fn record_deviation(&mut self, mut deviation: Deviation) {
    deviation.timestamp = self.clock.now();
    self
      .recent
      .entry(deviation.component.clone())
      .or_default()
      .push(deviation);
  }

  /// Build correlation groups from deviations recorded within the time window.
  ///
  /// Each component lands in at most one group per call. Buffered deviations
  /// are not consumed and stay eligible for later calls while in the window.
  pub fn correlate(&self) -> Vec<CorrelationGroup> {
    let now = self.clock.now();

    let active: IndexMap<&str, Vec<&Deviation>> = self
      .recent
      .iter()
      .filter_map(|(component, deviations)| {
        let live: Vec<&Deviation> = deviations
          .iter()
          .filter(|d| self.is_active(d, now))
          .collect();
        (!live.is_empty()).then_some((component.as_str(), live))
      })
      .collect();

    let mut visited: HashSet<&str> = HashSet::new();
    let mut groups = Vec::new();

    for &seed in active.keys() {
      if visited.contains(seed) {
        continue;
      }
      let group = self.collect_downstream(seed, &active, &mut visited);

      let components = group_components(&group);
      if components.len() >= 2 {
        info!(
          components = ?components,
          deviations = group.len(),
          "correlation group formed"
        );
        groups.push(group);
      }
    }

    groups
  }

  /// Depth-first walk along outgoing edges from `seed`.
  fn collect_downstream<'a>(
    &'a self,
    seed: &'a str,
    active: &IndexMap<&str, Vec<&Deviation>>,
    visited: &mut HashSet<&'a str>,
  ) -> CorrelationGroup {
    let mut stack = vec![seed];
    let mut group = Vec::new();

    while let Some(current) = stack.pop() {
      if !visited.insert(current) {
        continue;
      }
      if let Some(deviations) = active.get(current) {
        group.extend(deviations.iter().map(|&d| d.clone()));
      }
      if let Some(downstream) = self.graph.get(current) {
        stack.extend(downstream.iter().map(String::as_str));
      }
    }

    group
  }

  fn is_active(&self, deviation: &Deviation, now: DateTime<Utc>) -> bool {
    now - deviation.timestamp <= self.time_window
  }

  /// Drop deviations that have aged out of the window.
  pub fn evict_expired(&mut self) -> usize {
    let now = self.clock.now();
    let window = self.time_window;
    let mut evicted = 0;
    for deviations in self.recent.values_mut() {
      let before = deviations.len();
      deviations.retain(|d| now - d.timestamp <= window);
      evicted += before - deviations.len();
    }
    self.recent.retain(|_, deviations| !deviations.is_empty());
    evicted
  }

  /// Total deviations currently buffered, active or not.
  pub fn buffered(&self) -> usize {
    self.recent.values().map(Vec::len).sum()
  }

  pub fn graph(&self) -> &Graph {
    &self.graph
  }
}
