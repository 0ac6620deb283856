use serde::{Deserialize, Serialize};

/// A directed connection between two nodes.
///
/// Edges carry no data of their own; everything that flows along an edge is
/// expressed through the derived fields on action nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
  pub id: String,
  pub source_node_id: String,
  pub target_node_id: String,
}

impl Edge {
  pub fn new(
    id: impl Into<String>,
    source_node_id: impl Into<String>,
    target_node_id: impl Into<String>,
  ) -> Self {
    Self {
      id: id.into(),
      source_node_id: source_node_id.into(),
      target_node_id: target_node_id.into(),
    }
  }

  /// Build an edge whose id is derived from its endpoints.
  pub fn between(source_node_id: impl Into<String>, target_node_id: impl Into<String>) -> Self {
    let source_node_id = source_node_id.into();
    let target_node_id = target_node_id.into();
    Self {
      id: format!("edge-{}-{}", source_node_id, target_node_id),
      source_node_id,
      target_node_id,
    }
  }

  /// Whether this edge touches the given node as source or target.
  pub fn touches(&self, node_id: &str) -> bool {
    self.source_node_id == node_id || self.target_node_id == node_id
  }
}
