//! Run events and notifiers for observability.
//!
//! Events are emitted while a run progresses so callers can stream progress to
//! a UI, record it, or ignore it.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::result::{RunPhase, RunStatus};

/// Events emitted during a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RunEvent {
  /// The run moved to a new phase.
  PhaseChanged {
    execution_id: String,
    phase: RunPhase,
  },

  /// An action node's request was handed to the Transform Service.
  NodeDispatched {
    execution_id: String,
    node_id: String,
    correlation_id: String,
  },

  /// An action node produced a dataset.
  NodeCompleted {
    execution_id: String,
    node_id: String,
    correlation_id: String,
    dataset_id: String,
  },

  /// An action node failed.
  NodeFailed {
    execution_id: String,
    node_id: String,
    correlation_id: String,
    error: String,
  },

  /// A produced dataset matched no unmaterialized output by name.
  ReconciliationMiss {
    execution_id: String,
    node_id: String,
    dataset_name: String,
  },

  /// The run reached a terminal state.
  RunFinished {
    execution_id: String,
    status: RunStatus,
  },
}

/// Receiver of run events.
pub trait RunNotifier: Send + Sync {
  fn notify(&self, event: RunEvent);
}

/// A notifier that discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl RunNotifier for NoopNotifier {
  fn notify(&self, _event: RunEvent) {}
}

/// A notifier that forwards events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls a run; volume is a handful of
/// events per action node.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<RunEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<RunEvent>) -> Self {
    Self { sender }
  }
}

impl RunNotifier for ChannelNotifier {
  fn notify(&self, event: RunEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}
