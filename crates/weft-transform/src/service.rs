use async_trait::async_trait;

use crate::error::TransformError;
use crate::request::{DatasetDetails, TransformRequest};

/// The backend that performs dataset operations.
#[async_trait]
pub trait TransformService: Send + Sync {
  /// Run a transform. Returns the id of the newly created dataset.
  async fn transform(&self, request: &TransformRequest) -> Result<String, TransformError>;

  /// Fetch name, content type and size of a dataset.
  async fn dataset(&self, dataset_id: &str) -> Result<DatasetDetails, TransformError>;
}
