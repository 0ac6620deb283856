use std::collections::HashMap;

use crate::{Edge, Node};

/// Adjacency index over a graph, for traversal and analysis.
#[derive(Debug, Clone)]
pub struct Topology {
  /// Adjacency list: node_id -> list of downstream node_ids, in edge order.
  adjacency: HashMap<String, Vec<String>>,
  /// Reverse adjacency: node_id -> list of upstream node_ids, in edge order.
  reverse_adjacency: HashMap<String, Vec<String>>,
}

impl Topology {
  /// Build the index from nodes and edges.
  ///
  /// Edges naming unknown nodes are still indexed; callers that care check
  /// endpoints against the node list.
  pub fn new(nodes: &[Node], edges: &[Edge]) -> Self {
    let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
    let mut reverse_adjacency: HashMap<String, Vec<String>> = HashMap::new();

    for node in nodes {
      adjacency.entry(node.id().to_string()).or_default();
      reverse_adjacency.entry(node.id().to_string()).or_default();
    }

    for edge in edges {
      adjacency
        .entry(edge.source_node_id.clone())
        .or_default()
        .push(edge.target_node_id.clone());
      reverse_adjacency
        .entry(edge.target_node_id.clone())
        .or_default()
        .push(edge.source_node_id.clone());
    }

    Self {
      adjacency,
      reverse_adjacency,
    }
  }

  /// Get downstream nodes for a given node.
  pub fn downstream(&self, node_id: &str) -> &[String] {
    self
      .adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Get upstream nodes for a given node.
  pub fn upstream(&self, node_id: &str) -> &[String] {
    self
      .reverse_adjacency
      .get(node_id)
      .map(|v| v.as_slice())
      .unwrap_or(&[])
  }

  /// Whether any edge starts or ends at the node.
  pub fn is_connected(&self, node_id: &str) -> bool {
    !self.downstream(node_id).is_empty() || !self.upstream(node_id).is_empty()
  }
}
