use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
  #[error("failed to parse graph document: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("duplicate edge id: {0}")]
  DuplicateEdge(String),
}
