//! Wire shapes for Transform Service calls.
//!
//! Request bodies use the service's camelCase field names.

use serde::{Deserialize, Serialize};

/// A request to one of the Transform Service operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransformRequest {
  Concatenate(ConcatenateRequest),
  Merge(MergeRequest),
  Standardize(StandardizeRequest),
  Split(SplitRequest),
  SplitAddress(AddressSplitRequest),
}

/// Join several columns of one dataset into a single column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConcatenateRequest {
  pub dataset: String,
  pub columns: Vec<String>,
  pub final_column_name: String,
  pub delimiter: String,
  pub output_file_name: String,
  pub description: String,
}

/// Join two datasets on a column each.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRequest {
  pub dataset1: String,
  pub dataset2: String,
  pub column1: String,
  pub column2: String,
  pub output_file_name: String,
  pub description: String,
}

/// Rewrite a column's values through a mapping table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardizeRequest {
  pub dataset_id: String,
  pub column: String,
  pub mappings: serde_json::Value,
  pub output_file_name: String,
  pub description: String,
}

/// Split columns by the given rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRequest {
  pub file_id: String,
  pub splits: Vec<serde_json::Value>,
  pub output_file_name: String,
  pub description: String,
}

/// Split an address column into its parts.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressSplitRequest {
  pub file_id: String,
  pub address_name: String,
  pub output_file_name: String,
  pub description: String,
}

impl TransformRequest {
  /// Path of the service endpoint handling this request.
  pub fn endpoint(&self) -> &'static str {
    match self {
      TransformRequest::Concatenate(_) => "concatenate",
      TransformRequest::Merge(_) => "merge",
      TransformRequest::Standardize(_) => "standardize",
      TransformRequest::Split(_) => "split",
      TransformRequest::SplitAddress(_) => "splitAddress",
    }
  }

  /// Name the produced dataset will be stored under.
  pub fn output_file_name(&self) -> &str {
    match self {
      TransformRequest::Concatenate(r) => &r.output_file_name,
      TransformRequest::Merge(r) => &r.output_file_name,
      TransformRequest::Standardize(r) => &r.output_file_name,
      TransformRequest::Split(r) => &r.output_file_name,
      TransformRequest::SplitAddress(r) => &r.output_file_name,
    }
  }
}

/// Response body of a transform call: `{newFileId}` or `{message}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransformResponse {
  #[serde(default)]
  pub new_file_id: Option<String>,
  #[serde(default)]
  pub message: Option<String>,
}

/// Metadata of a stored dataset, from `GET /dataset/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetDetails {
  pub name: String,
  #[serde(rename = "type")]
  pub content_type: String,
  pub size: u64,
}
