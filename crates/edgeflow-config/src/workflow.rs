use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::edge::EdgeDef;
use crate::error::ConfigError;
use crate::node::NodeDef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  #[serde(default, alias = "workflowId")]
  pub workflow_id: String,
  #[serde(default)]
  pub name: String,
  pub nodes: Vec<NodeDef>,
  #[serde(default)]
  pub edges: Vec<EdgeDef>,
}

impl WorkflowDef {
  /// Build a definition from the persisted `nodes` and `edges` columns.
  ///
  /// Each column may hold the JSON array itself or a string containing the
  /// JSON-encoded array. A null or missing edge list is treated as empty.
  pub fn from_parts(
    workflow_id: impl Into<String>,
    name: impl Into<String>,
    nodes: &Value,
    edges: &Value,
  ) -> Result<Self, ConfigError> {
    let nodes: Vec<NodeDef> = decode(nodes).map_err(|message| ConfigError::InvalidNodes { message })?;
    let edges: Vec<EdgeDef> = match edges {
      Value::Null => Vec::new(),
      other => decode(other).map_err(|message| ConfigError::InvalidEdges { message })?,
    };

    Ok(Self {
      workflow_id: workflow_id.into(),
      name: name.into(),
      nodes,
      edges,
    })
  }

  /// Parse a full definition from a JSON document.
  pub fn from_json(content: &str) -> Result<Self, ConfigError> {
    Ok(serde_json::from_str(content)?)
  }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, String> {
  match value {
    Value::String(encoded) => serde_json::from_str(encoded).map_err(|e| e.to_string()),
    other => serde_json::from_value(other.clone()).map_err(|e| e.to_string()),
  }
}
