use std::fmt;

use serde::{Deserialize, Serialize};

/// A node in a pipeline graph.
///
/// The variant is the node's kind; the JSON form carries it in a `kind` field
/// next to the variant's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
  Dataset(DatasetNode),
  Action(ActionNode),
  Output(OutputNode),
}

/// Discriminant of a [`Node`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
  Dataset,
  Action,
  Output,
}

impl fmt::Display for NodeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      NodeKind::Dataset => f.write_str("dataset"),
      NodeKind::Action => f.write_str("action"),
      NodeKind::Output => f.write_str("output"),
    }
  }
}

/// An already-materialized dataset. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetNode {
  pub id: String,
  pub dataset_id: String,
  pub name: String,
  pub content_type: String,
  pub size_bytes: u64,
}

/// A parameterized transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionNode {
  pub id: String,
  pub action_type: ActionType,
  /// Values collected from the action's configuration form.
  #[serde(default)]
  pub parameters: serde_json::Map<String, serde_json::Value>,
  /// Upstream data, in edge order. Derived by [`crate::project`].
  #[serde(default)]
  pub source_refs: Vec<SourceRef>,
  /// Downstream output. Derived by [`crate::project`].
  #[serde(default)]
  pub destination_ref: Option<DestinationRef>,
}

/// The destination of a transform.
///
/// `dataset_id` is `None` until a run materializes the output; after that the
/// dataset fields never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputNode {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub dataset_id: Option<String>,
  #[serde(default)]
  pub content_type: Option<String>,
  #[serde(default)]
  pub size_bytes: Option<u64>,
}

/// Reference to a data-bearing node feeding an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
  pub dataset_id: Option<String>,
  pub name: String,
}

/// Reference to the output an action writes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRef {
  pub dataset_id: Option<String>,
  pub name: String,
  pub description: String,
}

/// The operation an action node performs.
///
/// Unknown names are kept as [`ActionType::Other`] so that a graph saved with
/// an action this build does not know about still loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
  Concatenate,
  Merge,
  Standardize,
  Split,
  Other(String),
}

impl ActionType {
  pub fn as_str(&self) -> &str {
    match self {
      ActionType::Concatenate => "concatenate",
      ActionType::Merge => "merge",
      ActionType::Standardize => "standardize",
      ActionType::Split => "split",
      ActionType::Other(name) => name,
    }
  }
}

impl From<String> for ActionType {
  fn from(value: String) -> Self {
    match value.as_str() {
      "concatenate" => ActionType::Concatenate,
      "merge" => ActionType::Merge,
      "standardize" => ActionType::Standardize,
      "split" => ActionType::Split,
      _ => ActionType::Other(value),
    }
  }
}

impl From<&str> for ActionType {
  fn from(value: &str) -> Self {
    ActionType::from(value.to_string())
  }
}

impl From<ActionType> for String {
  fn from(value: ActionType) -> Self {
    match value {
      ActionType::Other(name) => name,
      known => known.as_str().to_string(),
    }
  }
}

impl fmt::Display for ActionType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Node {
  pub fn id(&self) -> &str {
    match self {
      Node::Dataset(n) => &n.id,
      Node::Action(n) => &n.id,
      Node::Output(n) => &n.id,
    }
  }

  pub fn kind(&self) -> NodeKind {
    match self {
      Node::Dataset(_) => NodeKind::Dataset,
      Node::Action(_) => NodeKind::Action,
      Node::Output(_) => NodeKind::Output,
    }
  }

  /// Display name. Action nodes are named by their action type.
  pub fn name(&self) -> &str {
    match self {
      Node::Dataset(n) => &n.name,
      Node::Action(n) => n.action_type.as_str(),
      Node::Output(n) => &n.name,
    }
  }

  /// Whether this node can feed data into an action.
  pub fn bears_data(&self) -> bool {
    matches!(self, Node::Dataset(_) | Node::Output(_))
  }

  pub fn as_action(&self) -> Option<&ActionNode> {
    match self {
      Node::Action(n) => Some(n),
      _ => None,
    }
  }

  pub fn as_output(&self) -> Option<&OutputNode> {
    match self {
      Node::Output(n) => Some(n),
      _ => None,
    }
  }

  /// The reference an action node records for this node as an input.
  pub(crate) fn source_ref(&self) -> Option<SourceRef> {
    match self {
      Node::Dataset(n) => Some(SourceRef {
        dataset_id: Some(n.dataset_id.clone()),
        name: n.name.clone(),
      }),
      Node::Output(n) => Some(SourceRef {
        dataset_id: n.dataset_id.clone(),
        name: n.name.clone(),
      }),
      Node::Action(_) => None,
    }
  }
}

impl ActionNode {
  pub fn new(id: impl Into<String>, action_type: impl Into<ActionType>) -> Self {
    Self {
      id: id.into(),
      action_type: action_type.into(),
      parameters: serde_json::Map::new(),
      source_refs: Vec::new(),
      destination_ref: None,
    }
  }

  pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
    if let serde_json::Value::Object(map) = parameters {
      self.parameters = map;
    }
    self
  }
}

impl OutputNode {
  /// A new, not yet materialized output.
  pub fn new(id: impl Into<String>, name: impl Into<String>, description: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      name: name.into(),
      description: description.into(),
      dataset_id: None,
      content_type: None,
      size_bytes: None,
    }
  }

  pub fn is_materialized(&self) -> bool {
    self.dataset_id.is_some()
  }

  pub(crate) fn destination_ref(&self) -> DestinationRef {
    DestinationRef {
      dataset_id: self.dataset_id.clone(),
      name: self.name.clone(),
      description: self.description.clone(),
    }
  }
}

/// Generate a client-side node id of the form `{kind}-{source_id}-{timestamp_ms}`.
pub fn node_id(kind: NodeKind, source_id: &str) -> String {
  format!(
    "{}-{}-{}",
    kind,
    source_id,
    chrono::Utc::now().timestamp_millis()
  )
}
