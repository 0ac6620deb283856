//! Incremental run planning.
//!
//! Outputs that already hold a dataset are never produced again. A run only
//! executes the action nodes writing to outputs that still need one.

use std::collections::HashSet;

use weft_graph::{ActionNode, Graph, Node};

/// What a run should execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Plan {
  /// Every output is already materialized.
  NoOp {
    /// Ids of the materialized output nodes.
    materialized: Vec<String>,
  },
  /// Action nodes to dispatch, in graph order.
  Execute { frontier: Vec<ActionNode> },
}

impl Plan {
  /// The action nodes to dispatch; empty for a no-op plan.
  pub fn frontier(&self) -> &[ActionNode] {
    match self {
      Plan::NoOp { .. } => &[],
      Plan::Execute { frontier } => frontier,
    }
  }

  pub fn is_noop(&self) -> bool {
    matches!(self, Plan::NoOp { .. })
  }
}

/// Select the action nodes this run must execute.
///
/// Expects a graph whose action nodes are projected and which passed
/// validation.
pub fn plan(graph: &Graph) -> Plan {
  let (with_dataset, needing_dataset): (Vec<_>, Vec<_>) = graph
    .nodes
    .iter()
    .filter_map(Node::as_output)
    .partition(|output| output.is_materialized());

  if needing_dataset.is_empty() && !with_dataset.is_empty() {
    return Plan::NoOp {
      materialized: with_dataset.iter().map(|o| o.id.clone()).collect(),
    };
  }

  let actions = graph.nodes.iter().filter_map(Node::as_action);

  if needing_dataset.is_empty() {
    return Plan::Execute {
      frontier: actions.cloned().collect(),
    };
  }

  let needing: HashSet<&str> = needing_dataset.iter().map(|o| o.id.as_str()).collect();
  let topology = graph.topology();

  let frontier = actions
    .filter(|action| {
      topology
        .downstream(&action.id)
        .iter()
        .any(|target| needing.contains(target.as_str()))
    })
    .cloned()
    .collect();

  Plan::Execute { frontier }
}
