//! Run result types.

use std::fmt;

use serde::{Deserialize, Serialize};
use weft_graph::Node;

use crate::validator::ValidationError;

/// Phase of a pipeline run.
///
/// ```text
/// Idle → Validating → Rejected
///                   → Planning → NoOpDone
///                              → Dispatching → Reconciling → Succeeded
///                                                          → PartiallyFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
  Idle,
  Validating,
  Rejected,
  Planning,
  NoOpDone,
  Dispatching,
  Reconciling,
  Succeeded,
  PartiallyFailed,
}

impl RunPhase {
  /// Whether `next` directly follows this phase.
  pub fn can_advance_to(self, next: RunPhase) -> bool {
    use RunPhase::*;
    matches!(
      (self, next),
      (Idle, Validating)
        | (Validating, Rejected)
        | (Validating, Planning)
        | (Planning, NoOpDone)
        | (Planning, Dispatching)
        | (Dispatching, Reconciling)
        | (Reconciling, Succeeded)
        | (Reconciling, PartiallyFailed)
    )
  }

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      RunPhase::Rejected | RunPhase::NoOpDone | RunPhase::Succeeded | RunPhase::PartiallyFailed
    )
  }
}

impl fmt::Display for RunPhase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      RunPhase::Idle => "idle",
      RunPhase::Validating => "validating",
      RunPhase::Rejected => "rejected",
      RunPhase::Planning => "planning",
      RunPhase::NoOpDone => "no_op_done",
      RunPhase::Dispatching => "dispatching",
      RunPhase::Reconciling => "reconciling",
      RunPhase::Succeeded => "succeeded",
      RunPhase::PartiallyFailed => "partially_failed",
    };
    f.write_str(name)
  }
}

/// Overall outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
  /// The graph failed validation; nothing was dispatched.
  Rejected,
  /// Every output was already materialized; nothing was dispatched.
  NoOp,
  /// Every dispatched action node succeeded.
  Succeeded,
  /// At least one dispatched action node failed.
  PartiallyFailed,
}

impl From<RunStatus> for RunPhase {
  fn from(status: RunStatus) -> Self {
    match status {
      RunStatus::Rejected => RunPhase::Rejected,
      RunStatus::NoOp => RunPhase::NoOpDone,
      RunStatus::Succeeded => RunPhase::Succeeded,
      RunStatus::PartiallyFailed => RunPhase::PartiallyFailed,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
  Info,
  Success,
  Warning,
  Error,
}

/// A user-facing message about a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub level: NotificationLevel,
  pub message: String,
}

impl Notification {
  pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
    Self {
      level,
      message: message.into(),
    }
  }
}

/// An output node populated by this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciledOutput {
  pub output_node_id: String,
  pub action_node_id: String,
  pub dataset_id: String,
}

/// An action node that failed in this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeFailure {
  pub node_id: String,
  pub correlation_id: String,
  pub error: String,
}

/// A produced dataset whose name matched no unmaterialized output node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationMiss {
  pub action_node_id: String,
  pub dataset_id: String,
  pub dataset_name: String,
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
  /// Unique execution ID.
  pub execution_id: String,
  pub status: RunStatus,
  /// The graph's nodes after reconciliation.
  pub nodes: Vec<Node>,
  /// The violated rule when the run was rejected.
  pub violation: Option<ValidationError>,
  /// Number of action nodes dispatched.
  pub dispatched: usize,
  pub reconciled: Vec<ReconciledOutput>,
  pub failures: Vec<NodeFailure>,
  pub misses: Vec<ReconciliationMiss>,
  pub notifications: Vec<Notification>,
}

impl RunResult {
  /// Whether the run populated any output node.
  pub fn changed(&self) -> bool {
    !self.reconciled.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_run_phase_transitions() {
    assert!(RunPhase::Idle.can_advance_to(RunPhase::Validating));
    assert!(RunPhase::Validating.can_advance_to(RunPhase::Rejected));
    assert!(RunPhase::Planning.can_advance_to(RunPhase::NoOpDone));
    assert!(RunPhase::Reconciling.can_advance_to(RunPhase::PartiallyFailed));

    assert!(!RunPhase::Idle.can_advance_to(RunPhase::Dispatching));
    assert!(!RunPhase::Validating.can_advance_to(RunPhase::Dispatching));
    assert!(!RunPhase::Dispatching.can_advance_to(RunPhase::Succeeded));
    assert!(!RunPhase::Succeeded.can_advance_to(RunPhase::Validating));
  }

  #[test]
  fn test_every_status_maps_to_a_terminal_phase() {
    for status in [
      RunStatus::Rejected,
      RunStatus::NoOp,
      RunStatus::Succeeded,
      RunStatus::PartiallyFailed,
    ] {
      assert!(RunPhase::from(status).is_terminal(), "{:?}", status);
    }
    assert!(!RunPhase::Reconciling.is_terminal());
  }
}
