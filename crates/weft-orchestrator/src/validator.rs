//! Graph validation.
//!
//! A run starts only when every rule here holds. Rules are checked in a fixed
//! order and the first violation is reported.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use weft_graph::{Graph, Node, NodeKind};

/// A violated validation rule.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ValidationError {
  #[error("the graph is empty; add at least one node")]
  EmptyGraph,

  #[error("more than one node has id '{node_id}'")]
  DuplicateNodeId { node_id: String },

  #[error("edge '{edge_id}' references unknown node '{node_id}'")]
  DanglingEdge { edge_id: String, node_id: String },

  #[error("'{source_node_id}' is connected to '{target_node_id}' more than once")]
  DuplicateEdge {
    source_node_id: String,
    target_node_id: String,
  },

  #[error("edge '{edge_id}' cannot connect a {source_kind} node to a {target_kind} node")]
  ForbiddenEdge {
    edge_id: String,
    source_kind: NodeKind,
    target_kind: NodeKind,
  },

  #[error("node '{node_id}' is not connected to anything")]
  OrphanNode { node_id: String },

  #[error("action '{node_id}' has no input dataset")]
  ActionMissingInput { node_id: String },

  #[error("action '{node_id}' has no output")]
  ActionMissingOutput { node_id: String },

  #[error("action '{node_id}' is missing parameters; complete its configuration")]
  MissingParameters { node_id: String },

  #[error("more than one output is named '{name}'")]
  DuplicateOutputName { name: String },
}

impl ValidationError {
  /// Short name of the violated rule.
  pub fn rule(&self) -> &'static str {
    match self {
      ValidationError::EmptyGraph => "empty graph",
      ValidationError::DuplicateNodeId { .. } => "duplicate node id",
      ValidationError::DanglingEdge { .. } => "dangling edge",
      ValidationError::DuplicateEdge { .. } => "duplicate edge",
      ValidationError::ForbiddenEdge { .. } => "forbidden edge",
      ValidationError::OrphanNode { .. } => "orphan node",
      ValidationError::ActionMissingInput { .. } => "missing input",
      ValidationError::ActionMissingOutput { .. } => "missing output",
      ValidationError::MissingParameters { .. } => "missing parameters",
      ValidationError::DuplicateOutputName { .. } => "duplicate output name",
    }
  }
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
  pub valid: bool,
  pub violation: Option<ValidationError>,
}

impl ValidationResult {
  fn from_check(check: Result<(), ValidationError>) -> Self {
    match check {
      Ok(()) => Self {
        valid: true,
        violation: None,
      },
      Err(violation) => Self {
        valid: false,
        violation: Some(violation),
      },
    }
  }

  pub fn into_result(self) -> Result<(), ValidationError> {
    match self.violation {
      Some(violation) => Err(violation),
      None => Ok(()),
    }
  }
}

/// Check whether a graph may be run.
pub fn validate(graph: &Graph) -> ValidationResult {
  ValidationResult::from_check(check(graph))
}

/// The only edge shapes a runnable graph may contain.
fn edge_allowed(source: NodeKind, target: NodeKind) -> bool {
  matches!(
    (source, target),
    (NodeKind::Dataset | NodeKind::Output, NodeKind::Action) | (NodeKind::Action, NodeKind::Output)
  )
}

fn check(graph: &Graph) -> Result<(), ValidationError> {
  if graph.nodes.is_empty() {
    return Err(ValidationError::EmptyGraph);
  }

  let mut ids = HashSet::new();
  for node in &graph.nodes {
    if !ids.insert(node.id()) {
      return Err(ValidationError::DuplicateNodeId {
        node_id: node.id().to_string(),
      });
    }
  }

  let kinds: HashMap<&str, NodeKind> = graph
    .nodes
    .iter()
    .map(|node| (node.id(), node.kind()))
    .collect();

  let mut pairs = HashSet::new();
  for edge in &graph.edges {
    let source_kind = endpoint_kind(&kinds, &edge.id, &edge.source_node_id)?;
    let target_kind = endpoint_kind(&kinds, &edge.id, &edge.target_node_id)?;

    if !pairs.insert((edge.source_node_id.as_str(), edge.target_node_id.as_str())) {
      return Err(ValidationError::DuplicateEdge {
        source_node_id: edge.source_node_id.clone(),
        target_node_id: edge.target_node_id.clone(),
      });
    }

    if !edge_allowed(source_kind, target_kind) {
      return Err(ValidationError::ForbiddenEdge {
        edge_id: edge.id.clone(),
        source_kind,
        target_kind,
      });
    }
  }

  let topology = graph.topology();

  for node in &graph.nodes {
    if !topology.is_connected(node.id()) {
      return Err(ValidationError::OrphanNode {
        node_id: node.id().to_string(),
      });
    }
  }

  for action in graph.nodes.iter().filter_map(Node::as_action) {
    if topology.upstream(&action.id).is_empty() {
      return Err(ValidationError::ActionMissingInput {
        node_id: action.id.clone(),
      });
    }
    if topology.downstream(&action.id).is_empty() {
      return Err(ValidationError::ActionMissingOutput {
        node_id: action.id.clone(),
      });
    }
  }

  for action in graph.nodes.iter().filter_map(Node::as_action) {
    if action.parameters.is_empty() {
      return Err(ValidationError::MissingParameters {
        node_id: action.id.clone(),
      });
    }
  }

  let mut names = HashSet::new();
  for output in graph.nodes.iter().filter_map(Node::as_output) {
    if !names.insert(output.name.as_str()) {
      return Err(ValidationError::DuplicateOutputName {
        name: output.name.clone(),
      });
    }
  }

  Ok(())
}

fn endpoint_kind(
  kinds: &HashMap<&str, NodeKind>,
  edge_id: &str,
  node_id: &str,
) -> Result<NodeKind, ValidationError> {
  kinds
    .get(node_id)
    .copied()
    .ok_or_else(|| ValidationError::DanglingEdge {
      edge_id: edge_id.to_string(),
      node_id: node_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use weft_graph::{ActionNode, ActionType, DatasetNode, Edge, OutputNode};

  fn dataset(id: &str) -> Node {
    Node::Dataset(DatasetNode {
      id: id.to_string(),
      dataset_id: format!("ds-{}", id),
      name: format!("{}.csv", id),
      content_type: "text/csv".to_string(),
      size_bytes: 10,
    })
  }

  fn merge(id: &str) -> Node {
    Node::Action(
      ActionNode::new(id, ActionType::Merge)
        .with_parameters(json!({"column1": "id", "column2": "id"})),
    )
  }

  fn output(id: &str, name: &str) -> Node {
    Node::Output(OutputNode::new(id, name, ""))
  }

  fn merge_graph() -> Graph {
    Graph::new(
      vec![dataset("a"), dataset("b"), merge("m"), output("o", "merged.csv")],
      vec![
        Edge::between("a", "m"),
        Edge::between("b", "m"),
        Edge::between("m", "o"),
      ],
    )
  }

  fn violation(graph: &Graph) -> ValidationError {
    validate(graph).violation.expect("expected a violation")
  }

  #[test]
  fn test_valid_merge_graph() {
    let result = validate(&merge_graph());
    assert!(result.valid);
    assert!(result.violation.is_none());
  }

  #[test]
  fn test_empty_graph() {
    let result = validate(&Graph::default());
    assert!(!result.valid);
    assert_eq!(result.violation, Some(ValidationError::EmptyGraph));
  }

  #[test]
  fn test_duplicate_node_id() {
    let mut graph = merge_graph();
    graph.nodes.push(output("o", "copy.csv"));

    let err = violation(&graph);
    assert_eq!(err.rule(), "duplicate node id");
    assert_eq!(
      err,
      ValidationError::DuplicateNodeId {
        node_id: "o".to_string()
      }
    );
  }

  #[test]
  fn test_forbidden_edge_shapes() {
    let mut base = merge_graph();
    base.nodes.push(merge("m2"));
    base.nodes.push(dataset("c"));
    base.nodes.push(output("o2", "other.csv"));

    let forbidden = [
      ("c", "o2", NodeKind::Dataset, NodeKind::Output),
      ("m", "c", NodeKind::Action, NodeKind::Dataset),
      ("m", "m2", NodeKind::Action, NodeKind::Action),
      ("c", "a", NodeKind::Dataset, NodeKind::Dataset),
      ("o", "o2", NodeKind::Output, NodeKind::Output),
    ];

    for (source, target, source_kind, target_kind) in forbidden {
      let mut graph = base.clone();
      graph.edges.push(Edge::between(source, target));

      let err = violation(&graph);
      assert_eq!(
        err,
        ValidationError::ForbiddenEdge {
          edge_id: format!("edge-{}-{}", source, target),
          source_kind,
          target_kind,
        },
        "{} -> {}",
        source,
        target
      );
    }
  }

  #[test]
  fn test_output_may_feed_an_action() {
    let mut graph = merge_graph();
    graph.nodes.push(
      Node::Action(
        ActionNode::new("s", ActionType::Standardize)
          .with_parameters(json!({"column": "country", "mappings": {"UK": "GB"}})),
      ),
    );
    graph.nodes.push(output("o2", "standardized.csv"));
    graph.edges.push(Edge::between("o", "s"));
    graph.edges.push(Edge::between("s", "o2"));

    assert!(validate(&graph).valid);
  }

  #[test]
  fn test_orphan_node() {
    let mut graph = merge_graph();
    graph.nodes.push(dataset("lonely"));

    assert_eq!(
      violation(&graph),
      ValidationError::OrphanNode {
        node_id: "lonely".to_string()
      }
    );
  }

  #[test]
  fn test_action_needs_input_and_output() {
    let mut graph = merge_graph();
    graph.edges.retain(|e| e.target_node_id != "o");
    graph.nodes.retain(|n| n.id() != "o");
    assert_eq!(violation(&graph).rule(), "missing output");

    let mut graph = merge_graph();
    graph.edges.retain(|e| e.target_node_id != "m");
    graph.nodes.retain(|n| n.id() != "a" && n.id() != "b");
    assert_eq!(violation(&graph).rule(), "missing input");
  }

  #[test]
  fn test_missing_parameters() {
    let mut graph = merge_graph();
    graph.nodes[2] = Node::Action(ActionNode::new("m", ActionType::Merge));

    let result = validate(&graph);
    assert!(!result.valid);
    let err = result.violation.unwrap();
    assert_eq!(err.rule(), "missing parameters");
    assert_eq!(
      err,
      ValidationError::MissingParameters {
        node_id: "m".to_string()
      }
    );
  }

  #[test]
  fn test_dangling_and_duplicate_edges() {
    let mut graph = merge_graph();
    graph.edges.push(Edge::new("e-ghost", "ghost", "m"));
    assert_eq!(
      violation(&graph),
      ValidationError::DanglingEdge {
        edge_id: "e-ghost".to_string(),
        node_id: "ghost".to_string()
      }
    );

    let mut graph = merge_graph();
    graph.edges.push(Edge::new("e-again", "a", "m"));
    assert_eq!(violation(&graph).rule(), "duplicate edge");
  }

  #[test]
  fn test_duplicate_output_names() {
    let mut graph = merge_graph();
    graph.nodes.push(dataset("c"));
    graph.nodes.push(merge("m2"));
    graph.nodes.push(output("o2", "merged.csv"));
    graph.edges.push(Edge::between("c", "m2"));
    graph.edges.push(Edge::between("a", "m2"));
    graph.edges.push(Edge::between("m2", "o2"));

    assert_eq!(
      violation(&graph),
      ValidationError::DuplicateOutputName {
        name: "merged.csv".to_string()
      }
    );
  }
}
