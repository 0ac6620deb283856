//! Error types for action-node dispatch.

use thiserror::Error;
use weft_transform::TransformError;

/// Why a single action node did not produce a dataset.
///
/// These errors stay with the node that raised them; sibling nodes in the
/// same run are unaffected.
#[derive(Debug, Error)]
pub enum DispatchError {
  /// The node's action type has no Transform Service operation.
  #[error("unsupported action type: {0}")]
  UnsupportedActionType(String),

  /// A required parameter is absent.
  #[error("missing parameter '{0}'")]
  MissingParameter(String),

  /// A parameter is present but has the wrong shape.
  #[error("invalid parameter '{name}': {message}")]
  InvalidParameter { name: String, message: String },

  /// Fewer upstream datasets than the operation needs.
  #[error("expected {expected} source dataset(s), found {found}")]
  MissingSource { expected: usize, found: usize },

  /// An upstream output has not been produced yet.
  #[error("source '{0}' has not been materialized")]
  UnmaterializedSource(String),

  /// The node has no output to write to.
  #[error("action has no destination output")]
  MissingDestination,

  /// The Transform Service call failed.
  #[error(transparent)]
  Transform(#[from] TransformError),

  /// The round trip exceeded the configured timeout.
  #[error("timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The run was cancelled before the node finished.
  #[error("cancelled")]
  Cancelled,

  /// The dispatch task panicked or was aborted.
  #[error("dispatch task failed: {0}")]
  Join(String),
}
