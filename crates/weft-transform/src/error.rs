use thiserror::Error;

/// Errors from a Transform Service call.
#[derive(Debug, Error)]
pub enum TransformError {
  /// The service base URL could not be used.
  #[error("invalid service url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  /// Transport-level failure.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// The service answered with a failure.
  #[error("{endpoint} failed with status {status}: {message}")]
  Rejected {
    endpoint: String,
    status: u16,
    message: String,
  },

  /// The service answered successfully but without a dataset id.
  #[error("{endpoint} returned no new file id")]
  MissingFileId { endpoint: String },
}
