//! Edge projection.
//!
//! Action nodes do not store their inputs and outputs directly; they are
//! derived from the edges touching them. [`project`] recomputes that context
//! for every action node from scratch, so the result only ever reflects the
//! edges passed in.

use std::collections::HashMap;

use crate::{Edge, Node};

/// Recompute `source_refs` and `destination_ref` for every action node.
///
/// - dataset/output → action appends the source to the action's `source_refs`
///   in edge order,
/// - action → output sets the action's `destination_ref` (the last such edge
///   wins).
///
/// All other edges are ignored, as are edges naming unknown nodes. Non-action
/// nodes are returned unchanged. Calling this twice with the same edges gives
/// the same nodes.
pub fn project(nodes: &[Node], edges: &[Edge]) -> Vec<Node> {
  let mut projected: Vec<Node> = nodes.to_vec();

  for node in &mut projected {
    if let Node::Action(action) = node {
      action.source_refs.clear();
      action.destination_ref = None;
    }
  }

  let index: HashMap<&str, usize> = nodes
    .iter()
    .enumerate()
    .map(|(i, node)| (node.id(), i))
    .collect();

  for edge in edges {
    let (Some(&source_idx), Some(&target_idx)) = (
      index.get(edge.source_node_id.as_str()),
      index.get(edge.target_node_id.as_str()),
    ) else {
      continue;
    };

    // Read endpoints from the input slice; derived fields never feed back in.
    match (&nodes[source_idx], &nodes[target_idx]) {
      (source, Node::Action(_)) if source.bears_data() => {
        if let (Some(source_ref), Node::Action(action)) =
          (source.source_ref(), &mut projected[target_idx])
        {
          action.source_refs.push(source_ref);
        }
      }
      (Node::Action(_), Node::Output(output)) => {
        if let Node::Action(action) = &mut projected[source_idx] {
          action.destination_ref = Some(output.destination_ref());
        }
      }
      _ => {}
    }
  }

  projected
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{ActionNode, ActionType, DatasetNode, OutputNode, SourceRef};
  use serde_json::json;

  fn dataset(id: &str, dataset_id: &str, name: &str) -> Node {
    Node::Dataset(DatasetNode {
      id: id.to_string(),
      dataset_id: dataset_id.to_string(),
      name: name.to_string(),
      content_type: "text/csv".to_string(),
      size_bytes: 128,
    })
  }

  fn merge_graph() -> (Vec<Node>, Vec<Edge>) {
    let nodes = vec![
      dataset("a", "ds-a", "customers.csv"),
      dataset("b", "ds-b", "orders.csv"),
      Node::Action(
        ActionNode::new("m", ActionType::Merge)
          .with_parameters(json!({"column1": "id", "column2": "id"})),
      ),
      Node::Output(OutputNode::new("o", "merged.csv", "customers with orders")),
    ];
    let edges = vec![
      Edge::between("a", "m"),
      Edge::between("b", "m"),
      Edge::between("m", "o"),
    ];
    (nodes, edges)
  }

  fn action<'a>(nodes: &'a [Node], id: &str) -> &'a ActionNode {
    nodes
      .iter()
      .find(|n| n.id() == id)
      .and_then(Node::as_action)
      .unwrap()
  }

  #[test]
  fn test_projects_sources_in_edge_order_and_destination() {
    let (nodes, edges) = merge_graph();
    let projected = project(&nodes, &edges);

    let merge = action(&projected, "m");
    assert_eq!(
      merge.source_refs,
      vec![
        SourceRef {
          dataset_id: Some("ds-a".to_string()),
          name: "customers.csv".to_string(),
        },
        SourceRef {
          dataset_id: Some("ds-b".to_string()),
          name: "orders.csv".to_string(),
        },
      ]
    );

    let destination = merge.destination_ref.as_ref().unwrap();
    assert_eq!(destination.name, "merged.csv");
    assert_eq!(destination.description, "customers with orders");
    assert_eq!(destination.dataset_id, None);
  }

  #[test]
  fn test_projection_is_idempotent() {
    let (nodes, edges) = merge_graph();
    let once = project(&nodes, &edges);
    let twice = project(&once, &edges);

    assert_eq!(once, twice);
    assert_eq!(action(&twice, "m").source_refs.len(), 2);
  }

  #[test]
  fn test_removed_edge_drops_derived_context() {
    let (nodes, edges) = merge_graph();
    let projected = project(&nodes, &edges);

    let remaining: Vec<Edge> = edges
      .into_iter()
      .filter(|e| e.source_node_id != "b" && e.target_node_id != "o")
      .collect();
    let reprojected = project(&projected, &remaining);

    let merge = action(&reprojected, "m");
    assert_eq!(merge.source_refs.len(), 1);
    assert_eq!(merge.source_refs[0].name, "customers.csv");
    assert!(merge.destination_ref.is_none());
  }

  #[test]
  fn test_output_node_feeds_action_as_source() {
    let nodes = vec![
      Node::Output(OutputNode::new("o1", "stage.csv", "")),
      Node::Action(ActionNode::new("s", ActionType::Standardize)),
    ];
    let edges = vec![Edge::between("o1", "s")];

    let projected = project(&nodes, &edges);
    let standardize = action(&projected, "s");
    assert_eq!(
      standardize.source_refs,
      vec![SourceRef {
        dataset_id: None,
        name: "stage.csv".to_string(),
      }]
    );
  }

  #[test]
  fn test_ignores_other_edge_shapes_and_unknown_endpoints() {
    let (mut nodes, _) = merge_graph();
    nodes.push(Node::Action(ActionNode::new("m2", ActionType::Concatenate)));
    let edges = vec![
      Edge::between("a", "o"),
      Edge::between("m", "m2"),
      Edge::between("ghost", "m"),
    ];

    let projected = project(&nodes, &edges);
    assert!(action(&projected, "m").source_refs.is_empty());
    assert!(action(&projected, "m").destination_ref.is_none());
    assert!(action(&projected, "m2").source_refs.is_empty());
    assert_eq!(projected[0], nodes[0]);
    assert_eq!(projected[3], nodes[3]);
  }
}
