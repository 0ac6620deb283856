//! Building Transform Service requests from action nodes.

use serde::de::DeserializeOwned;
use weft_graph::{ActionNode, ActionType, DestinationRef};
use weft_transform::{
  AddressSplitRequest, ConcatenateRequest, MergeRequest, SplitRequest, StandardizeRequest,
  TransformRequest,
};

use crate::error::DispatchError;

/// `parameters.splitType` value selecting the address split operation.
const ADDRESS_SPLIT: &str = "address";

/// Build the request for one action node.
///
/// The operation is chosen by the node's action type; inputs come from its
/// projected `source_refs` and `destination_ref`, everything else from its
/// `parameters`.
pub fn build_request(action: &ActionNode) -> Result<TransformRequest, DispatchError> {
  let request = match &action.action_type {
    ActionType::Concatenate => {
      let destination = destination(action)?;
      TransformRequest::Concatenate(ConcatenateRequest {
        dataset: source_id(action, 0, 1)?,
        columns: required(action, "columns")?,
        final_column_name: required(action, "finalColumnName")?,
        delimiter: optional(action, "delimiter")?.unwrap_or_default(),
        output_file_name: destination.name.clone(),
        description: destination.description.clone(),
      })
    }
    ActionType::Merge => {
      let destination = destination(action)?;
      TransformRequest::Merge(MergeRequest {
        dataset1: source_id(action, 0, 2)?,
        dataset2: source_id(action, 1, 2)?,
        column1: required(action, "column1")?,
        column2: required(action, "column2")?,
        output_file_name: destination.name.clone(),
        description: destination.description.clone(),
      })
    }
    ActionType::Standardize => {
      let destination = destination(action)?;
      TransformRequest::Standardize(StandardizeRequest {
        dataset_id: source_id(action, 0, 1)?,
        column: required(action, "column")?,
        mappings: required(action, "mappings")?,
        output_file_name: destination.name.clone(),
        description: destination.description.clone(),
      })
    }
    ActionType::Split => {
      let destination = destination(action)?;
      let split_type: Option<String> = optional(action, "splitType")?;
      if split_type.as_deref() == Some(ADDRESS_SPLIT) {
        TransformRequest::SplitAddress(AddressSplitRequest {
          file_id: source_id(action, 0, 1)?,
          address_name: required(action, "addressName")?,
          output_file_name: destination.name.clone(),
          description: destination.description.clone(),
        })
      } else {
        TransformRequest::Split(SplitRequest {
          file_id: source_id(action, 0, 1)?,
          splits: required(action, "splits")?,
          output_file_name: destination.name.clone(),
          description: destination.description.clone(),
        })
      }
    }
    ActionType::Other(name) => return Err(DispatchError::UnsupportedActionType(name.clone())),
  };

  Ok(request)
}

fn destination(action: &ActionNode) -> Result<&DestinationRef, DispatchError> {
  action
    .destination_ref
    .as_ref()
    .ok_or(DispatchError::MissingDestination)
}

/// Dataset id of the `index`th source; `expected` is the operation's arity.
fn source_id(action: &ActionNode, index: usize, expected: usize) -> Result<String, DispatchError> {
  let source = action
    .source_refs
    .get(index)
    .ok_or(DispatchError::MissingSource {
      expected,
      found: action.source_refs.len(),
    })?;

  source
    .dataset_id
    .clone()
    .ok_or_else(|| DispatchError::UnmaterializedSource(source.name.clone()))
}

fn required<T: DeserializeOwned>(action: &ActionNode, name: &str) -> Result<T, DispatchError> {
  optional(action, name)?.ok_or_else(|| DispatchError::MissingParameter(name.to_string()))
}

fn optional<T: DeserializeOwned>(
  action: &ActionNode,
  name: &str,
) -> Result<Option<T>, DispatchError> {
  match action.parameters.get(name) {
    None | Some(serde_json::Value::Null) => Ok(None),
    Some(value) => serde_json::from_value(value.clone())
      .map(Some)
      .map_err(|e| DispatchError::InvalidParameter {
        name: name.to_string(),
        message: e.to_string(),
      }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use weft_graph::SourceRef;

  fn with_context(mut action: ActionNode, sources: &[(&str, &str)]) -> ActionNode {
    action.source_refs = sources
      .iter()
      .map(|(id, name)| SourceRef {
        dataset_id: Some(id.to_string()),
        name: name.to_string(),
      })
      .collect();
    action.destination_ref = Some(DestinationRef {
      dataset_id: None,
      name: "out.csv".to_string(),
      description: "result".to_string(),
    });
    action
  }

  #[test]
  fn test_merge_request() {
    let action = with_context(
      ActionNode::new("m", ActionType::Merge)
        .with_parameters(json!({"column1": "id", "column2": "customer_id"})),
      &[("ds-a", "a.csv"), ("ds-b", "b.csv")],
    );

    let request = build_request(&action).unwrap();
    assert_eq!(request.endpoint(), "merge");
    assert_eq!(
      request,
      TransformRequest::Merge(MergeRequest {
        dataset1: "ds-a".to_string(),
        dataset2: "ds-b".to_string(),
        column1: "id".to_string(),
        column2: "customer_id".to_string(),
        output_file_name: "out.csv".to_string(),
        description: "result".to_string(),
      })
    );
  }

  #[test]
  fn test_concatenate_request() {
    let action = with_context(
      ActionNode::new("c", ActionType::Concatenate).with_parameters(json!({
        "columns": ["first", "last"],
        "finalColumnName": "full_name",
        "delimiter": " "
      })),
      &[("ds-a", "a.csv")],
    );

    let body = serde_json::to_value(build_request(&action).unwrap()).unwrap();
    assert_eq!(
      body,
      json!({
        "dataset": "ds-a",
        "columns": ["first", "last"],
        "finalColumnName": "full_name",
        "delimiter": " ",
        "outputFileName": "out.csv",
        "description": "result"
      })
    );
  }

  #[test]
  fn test_standardize_request() {
    let action = with_context(
      ActionNode::new("s", ActionType::Standardize)
        .with_parameters(json!({"column": "country", "mappings": {"U.K.": "GB"}})),
      &[("ds-a", "a.csv")],
    );

    let request = build_request(&action).unwrap();
    assert_eq!(request.endpoint(), "standardize");
    let body = serde_json::to_value(&request).unwrap();
    assert_eq!(body["datasetId"], "ds-a");
    assert_eq!(body["mappings"], json!({"U.K.": "GB"}));
  }

  #[test]
  fn test_split_type_selects_operation() {
    let general = with_context(
      ActionNode::new("s", ActionType::Split).with_parameters(json!({
        "splitType": "general",
        "splits": [{"column": "name", "delimiter": " "}]
      })),
      &[("ds-a", "a.csv")],
    );
    assert_eq!(build_request(&general).unwrap().endpoint(), "split");

    let address = with_context(
      ActionNode::new("s", ActionType::Split)
        .with_parameters(json!({"splitType": "address", "addressName": "home"})),
      &[("ds-a", "a.csv")],
    );
    let request = build_request(&address).unwrap();
    assert_eq!(request.endpoint(), "splitAddress");
    assert_eq!(serde_json::to_value(&request).unwrap()["fileId"], "ds-a");
  }

  #[test]
  fn test_unsupported_action_type() {
    let action = with_context(
      ActionNode::new("p", "pivot").with_parameters(json!({"column": "x"})),
      &[("ds-a", "a.csv")],
    );

    let err = build_request(&action).unwrap_err();
    assert!(matches!(err, DispatchError::UnsupportedActionType(name) if name == "pivot"));
  }

  #[test]
  fn test_merge_needs_two_sources() {
    let action = with_context(
      ActionNode::new("m", ActionType::Merge)
        .with_parameters(json!({"column1": "id", "column2": "id"})),
      &[("ds-a", "a.csv")],
    );

    let err = build_request(&action).unwrap_err();
    assert!(matches!(
      err,
      DispatchError::MissingSource {
        expected: 2,
        found: 1
      }
    ));
  }

  #[test]
  fn test_parameter_errors() {
    let missing = with_context(
      ActionNode::new("m", ActionType::Merge).with_parameters(json!({"column1": "id"})),
      &[("ds-a", "a.csv"), ("ds-b", "b.csv")],
    );
    assert!(matches!(
      build_request(&missing).unwrap_err(),
      DispatchError::MissingParameter(name) if name == "column2"
    ));

    let wrong_shape = with_context(
      ActionNode::new("c", ActionType::Concatenate)
        .with_parameters(json!({"columns": "first,last", "finalColumnName": "name"})),
      &[("ds-a", "a.csv")],
    );
    assert!(matches!(
      build_request(&wrong_shape).unwrap_err(),
      DispatchError::InvalidParameter { name, .. } if name == "columns"
    ));
  }

  #[test]
  fn test_unmaterialized_source_and_missing_destination() {
    let mut action = with_context(
      ActionNode::new("s", ActionType::Standardize)
        .with_parameters(json!({"column": "country", "mappings": {}})),
      &[],
    );
    action.source_refs.push(SourceRef {
      dataset_id: None,
      name: "pending.csv".to_string(),
    });
    assert!(matches!(
      build_request(&action).unwrap_err(),
      DispatchError::UnmaterializedSource(name) if name == "pending.csv"
    ));

    action.destination_ref = None;
    assert!(matches!(
      build_request(&action).unwrap_err(),
      DispatchError::MissingDestination
    ));
  }
}
