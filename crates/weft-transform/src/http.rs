use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::error::TransformError;
use crate::request::{DatasetDetails, TransformRequest, TransformResponse};
use crate::service::TransformService;

/// Transform Service reached over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpTransformService {
  client: Client,
  base_url: Url,
}

impl HttpTransformService {
  /// Create a client for the service rooted at `base_url`.
  pub fn new(base_url: &str) -> Result<Self, TransformError> {
    Self::with_client(Client::new(), base_url)
  }

  /// Create a client reusing an existing [`Client`].
  pub fn with_client(client: Client, base_url: &str) -> Result<Self, TransformError> {
    let base_url = Url::parse(base_url).map_err(|e| TransformError::InvalidUrl {
      url: base_url.to_string(),
      message: e.to_string(),
    })?;

    if base_url.cannot_be_a_base() {
      return Err(TransformError::InvalidUrl {
        url: base_url.to_string(),
        message: "url cannot be used as a base".to_string(),
      });
    }

    Ok(Self { client, base_url })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  fn url(&self, segments: &[&str]) -> Result<Url, TransformError> {
    let mut url = self.base_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| TransformError::InvalidUrl {
        url: self.base_url.to_string(),
        message: "url cannot be used as a base".to_string(),
      })?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }
}

#[async_trait]
impl TransformService for HttpTransformService {
  async fn transform(&self, request: &TransformRequest) -> Result<String, TransformError> {
    let endpoint = request.endpoint();
    let url = self.url(&[endpoint])?;
    debug!(url = %url, endpoint = %endpoint, "transform_request");

    let response = self.client.post(url).json(request).send().await?;
    let status = response.status();
    let body = response.text().await?;
    let parsed: TransformResponse = serde_json::from_str(&body).unwrap_or_default();

    if !status.is_success() {
      return Err(TransformError::Rejected {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        message: parsed.message.unwrap_or(body),
      });
    }

    parsed
      .new_file_id
      .ok_or_else(|| TransformError::MissingFileId {
        endpoint: endpoint.to_string(),
      })
  }

  async fn dataset(&self, dataset_id: &str) -> Result<DatasetDetails, TransformError> {
    let url = self.url(&["dataset", dataset_id])?;
    debug!(url = %url, dataset_id = %dataset_id, "dataset_request");

    let response = self.client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      return Err(TransformError::Rejected {
        endpoint: "dataset".to_string(),
        status: status.as_u16(),
        message,
      });
    }

    Ok(response.json::<DatasetDetails>().await?)
  }
}
