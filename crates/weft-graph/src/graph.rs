use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::{Edge, Node, Topology};

/// The `{nodes, edges}` document a pipeline is stored and exchanged as.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
  #[serde(default)]
  pub nodes: Vec<Node>,
  #[serde(default)]
  pub edges: Vec<Edge>,
}

impl Graph {
  pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
    Self { nodes, edges }
  }

  /// Parse a graph document, rejecting repeated node or edge ids.
  pub fn from_json(json: &str) -> Result<Self, GraphError> {
    let graph: Graph = serde_json::from_str(json)?;
    graph.ensure_unique_ids()?;
    Ok(graph)
  }

  pub fn to_json(&self) -> Result<String, GraphError> {
    Ok(serde_json::to_string_pretty(self)?)
  }

  /// Build the adjacency index for traversal.
  pub fn topology(&self) -> Topology {
    Topology::new(&self.nodes, &self.edges)
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.nodes.iter().find(|n| n.id() == node_id)
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  fn ensure_unique_ids(&self) -> Result<(), GraphError> {
    let mut seen = HashSet::new();
    for node in &self.nodes {
      if !seen.insert(node.id()) {
        return Err(GraphError::DuplicateNode(node.id().to_string()));
      }
    }

    let mut seen = HashSet::new();
    for edge in &self.edges {
      if !seen.insert(edge.id.as_str()) {
        return Err(GraphError::DuplicateEdge(edge.id.clone()));
      }
    }

    Ok(())
  }
}
