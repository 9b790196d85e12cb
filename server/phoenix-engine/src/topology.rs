//! Topology model: nodes with criticality, directed edges, derived adjacency.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
  pub id: String,
  #[serde(default)]
  pub critical: bool,
}

/// Directed edge: `from` feeds `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub from: String,
  pub to: String,
}

/// Node id -> downstream node ids, in edge declaration order.
pub type Graph = HashMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
  pub nodes: Vec<Node>,
  pub edges: Vec<Edge>,
}

impl Topology {
  /// Parse and validate a topology document.
  pub fn from_json_str(s: &str) -> Result<Self, EngineError> {
    let topology: Topology =
      serde_json::from_str(s).map_err(|e| EngineError::topology(format!("parse: {}", e)))?;
    topology.validate()?;
    Ok(topology)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, EngineError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
      .map_err(|e| EngineError::topology(format!("cannot read {}: {}", path.display(), e)))?;
    Self::from_json_str(&raw)
  }

  /// Reject empty/duplicate node ids and dangling edge endpoints.
  pub fn validate(&self) -> Result<(), EngineError> {
    let mut ids = HashSet::with_capacity(self.nodes.len());
    for node in &self.nodes {
      if node.id.trim().is_empty() {
        return Err(EngineError::topology("node id must not be empty"));
      }
      if !ids.insert(node.id.as_str()) {
        return Err(EngineError::topology(format!("duplicate node id {}", node.id)));
      }
    }
    for edge in &self.edges {
      for endpoint in [&edge.from, &edge.to] {
        if !ids.contains(endpoint.as_str()) {
          return Err(EngineError::topology(format!(
            "edge {} -> {} references unknown node {}",
            edge.from, edge.to, endpoint
          )));
        }
      }
    }
    Ok(())
  }

  pub fn graph(&self) -> Graph {
    let mut graph: Graph = HashMap::new();
    for edge in &self.edges {
      graph.entry(edge.from.clone()).or_default().push(edge.to.clone());
    }
    graph
  }

  pub fn critical_components(&self) -> HashSet<String> {
    self
      .nodes
      .iter()
      .filter(|n| n.critical)
      .map(|n| n.id.clone())
      .collect()
  }
}
