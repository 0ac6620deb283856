use thiserror::Error;
use weft_graph::GraphError;

/// Errors from loading or saving a graph snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
  #[error("snapshot i/o error: {0}")]
  Io(#[from] std::io::Error),

  #[error("invalid snapshot: {0}")]
  Graph(#[from] GraphError),
}

/// Errors from graph store operations.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("edge not found: {0}")]
  EdgeNotFound(String),

  #[error("node already exists: {0}")]
  DuplicateNode(String),

  #[error("edge already exists: {0}")]
  DuplicateEdge(String),

  #[error(transparent)]
  Graph(#[from] GraphError),

  #[error("failed to persist graph snapshot: {0}")]
  Snapshot(#[from] SnapshotError),
}
