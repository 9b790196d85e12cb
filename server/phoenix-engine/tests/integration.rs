//! Integration tests for the decision engine.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use phoenix_engine::{
  Clock, Config, DeviationLevel, Engine, ManualClock, Observation, Severity, Topology,
};

fn chain_topology() -> Topology {
  Topology::from_json_str(
    r#"{
      "nodes": [
        {"id": "A"},
        {"id": "B"},
        {"id": "C", "critical": true}
      ],
      "edges": [
        {"from": "A", "to": "B"},
        {"from": "B", "to": "C"}
      ]
    }"#,
  )
  .unwrap()
}

fn manual_engine(topology: &Topology) -> (Arc<ManualClock>, Engine) {
  let clock = Arc::new(ManualClock::new(
    Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap(),
  ));
  let engine = Engine::new(Config::default(), topology, clock.clone()).unwrap();
  (clock, engine)
}

/// 30 samples around 20 with small deterministic noise.
fn learn_baseline(engine: &mut Engine, component: &str, metric: &str) {
  for i in 0..30 {
    let noise = if i % 2 == 0 { -1.0 } else { 1.0 };
    let incidents = engine
      .process(&Observation::new(component, metric, 20.0 + noise))
      .unwrap();
    assert!(incidents.is_empty());
  }
}

#[test]
fn end_to_end_chain_raises_medium_incident() {
  let topology = chain_topology();
  let (clock, mut engine) = manual_engine(&topology);

  learn_baseline(&mut engine, "A", "X");
  learn_baseline(&mut engine, "B", "X");
  assert!(engine.baselines().is_ready("A", "X"));
  assert!(engine.baselines().is_ready("B", "X"));

  // Let the baseline-time readings age out of the window.
  clock.advance_secs(60);

  let first = engine.process(&Observation::new("A", "X", 100.0)).unwrap();
  assert!(first.is_empty(), "a lone deviation must not escalate");

  clock.advance_secs(1);
  let second = engine.process(&Observation::new("B", "X", 100.0)).unwrap();
  assert_eq!(second.len(), 1);

  let incident = &second[0];
  assert_eq!(incident.severity, Severity::Medium);
  assert!(!incident.critical_involved);
  assert_eq!(
    incident.affected_components.iter().map(String::as_str).collect::<Vec<_>>(),
    vec!["A", "B"]
  );
  assert!(!incident.affected_components.contains("C"));
  assert_eq!(incident.confidence, 0.9);
  assert_eq!(incident.details.len(), 2);
  assert!(incident
    .details
    .iter()
    .all(|d| d.level == DeviationLevel::Strong));
  assert_eq!(incident.timestamp, clock.now());
}

#[test]
fn cooldown_suppresses_follow_up_incident() {
  let topology = chain_topology();
  let (clock, mut engine) = manual_engine(&topology);
  learn_baseline(&mut engine, "A", "X");
  learn_baseline(&mut engine, "B", "X");
  clock.advance_secs(60);

  engine.process(&Observation::new("A", "X", 100.0)).unwrap();
  let raised = engine.process(&Observation::new("B", "X", 100.0)).unwrap();
  assert_eq!(raised.len(), 1);

  clock.advance_secs(10);
  let suppressed = engine.process(&Observation::new("A", "X", 150.0)).unwrap();
  assert!(suppressed.is_empty());

  // Past the cooldown, fresh strong readings on both ends escalate again.
  clock.advance_secs(300);
  engine.process(&Observation::new("A", "X", 400.0)).unwrap();
  let again = engine.process(&Observation::new("B", "X", 400.0)).unwrap();
  assert_eq!(again.len(), 1);
  assert_ne!(again[0].incident_id, raised[0].incident_id);
}

#[test]
fn critical_downstream_component_raises_high_severity() {
  let topology = chain_topology();
  let (clock, mut engine) = manual_engine(&topology);
  learn_baseline(&mut engine, "B", "X");
  learn_baseline(&mut engine, "C", "X");
  clock.advance_secs(60);

  engine.process(&Observation::new("B", "X", 100.0)).unwrap();
  let incidents = engine.process(&Observation::new("C", "X", 100.0)).unwrap();
  assert_eq!(incidents.len(), 1);
  assert_eq!(incidents[0].severity, Severity::High);
  assert!(incidents[0].critical_involved);
  assert_eq!(incidents[0].confidence, 1.0);
}

#[test]
fn transitive_reach_through_quiet_node_escalates() {
  // Only A and C deviate; A reaches C through the quiet B.
  let topology = chain_topology();
  let (clock, mut engine) = manual_engine(&topology);
  learn_baseline(&mut engine, "A", "X");
  learn_baseline(&mut engine, "C", "X");
  clock.advance_secs(60);

  engine.process(&Observation::new("C", "X", 100.0)).unwrap();
  clock.advance_secs(1);
  let incidents = engine.process(&Observation::new("A", "X", 100.0)).unwrap();
  assert_eq!(incidents.len(), 1);
  assert_eq!(
    incidents[0].affected_components.iter().map(String::as_str).collect::<Vec<_>>(),
    vec!["A", "C"]
  );
  assert_eq!(incidents[0].severity, Severity::High);
}

#[test]
fn downstream_seed_does_not_walk_upstream() {
  // B was buffered before A, so B seeds first and claims itself alone.
  let topology = chain_topology();
  let (clock, mut engine) = manual_engine(&topology);
  learn_baseline(&mut engine, "B", "X");
  learn_baseline(&mut engine, "A", "X");
  clock.advance_secs(60);

  engine.process(&Observation::new("A", "X", 100.0)).unwrap();
  let incidents = engine.process(&Observation::new("B", "X", 100.0)).unwrap();
  assert!(incidents.is_empty());
}

#[test]
fn unconnected_components_never_escalate_together() {
  let topology = Topology::from_json_str(
    r#"{"nodes": [{"id": "A"}, {"id": "B"}], "edges": []}"#,
  )
  .unwrap();
  let (clock, mut engine) = manual_engine(&topology);
  learn_baseline(&mut engine, "A", "X");
  learn_baseline(&mut engine, "B", "X");
  clock.advance_secs(60);

  assert!(engine.process(&Observation::new("A", "X", 100.0)).unwrap().is_empty());
  assert!(engine.process(&Observation::new("B", "X", 100.0)).unwrap().is_empty());
}

#[test]
fn incident_serializes_to_json_contract() {
  let topology = chain_topology();
  let (clock, mut engine) = manual_engine(&topology);
  learn_baseline(&mut engine, "A", "X");
  learn_baseline(&mut engine, "B", "X");
  clock.advance_secs(60);

  engine.process(&Observation::new("A", "X", 100.0)).unwrap();
  let incident = engine
    .process(&Observation::new("B", "X", 100.0))
    .unwrap()
    .remove(0);

  let json = serde_json::to_value(&incident).unwrap();
  assert!(json["incident_id"].as_str().unwrap().starts_with("INC-"));
  assert_eq!(json["severity"], "medium");
  assert_eq!(json["affected_components"], serde_json::json!(["A", "B"]));
  assert_eq!(json["critical_involved"], false);
  assert_eq!(json["details"][0]["level"], "strong");
  assert_eq!(json["summary"], "Correlated system degradation detected");
}

#[test]
fn observation_json_ignores_unknown_fields() {
  let json = r#"{
    "timestamp": "2025-01-15T10:30:00.123456",
    "component": "router-edge",
    "metric": "latency_ms",
    "value": 17.482,
    "host": "edge-01"
  }"#;
  let raw: Observation = serde_json::from_str(json).unwrap();

  let topology = Topology::from_json_str(r#"{"nodes": [{"id": "router-edge"}], "edges": []}"#)
    .unwrap();
  let (_, mut engine) = manual_engine(&topology);
  assert!(engine.process(&raw).unwrap().is_empty());
  assert_eq!(engine.baselines().count("router-edge", "latency_ms"), 1);
}

#[test]
fn malformed_topology_is_rejected() {
  let err = Topology::from_json_str(
    r#"{"nodes": [{"id": "A"}], "edges": [{"from": "A", "to": "Z"}]}"#,
  )
  .unwrap_err();
  assert!(err.to_string().contains("Z"));
}

#[test]
fn sample_topology_ships_valid() {
  let path = concat!(env!("CARGO_MANIFEST_DIR"), "/topology/sample-topology.json");
  let topology = Topology::load(path).unwrap();
  assert_eq!(topology.nodes.len(), 5);
  assert!(topology.critical_components().contains("payment-service"));
  assert!(Engine::with_defaults(&topology).is_ok());
}
