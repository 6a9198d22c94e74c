use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single step in a workflow as authored in the builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDef {
  pub id: String,
  /// Handler tag, e.g. `data_request` or `http_request`. Unknown tags are kept.
  #[serde(rename = "type")]
  pub node_type: String,
  /// Flat node configuration.
  #[serde(default, deserialize_with = "null_as_empty")]
  pub data: Map<String, Value>,
  /// Structured configuration entries. Looked up before `data`.
  #[serde(default, deserialize_with = "null_as_default")]
  pub inputs: Vec<NodeInput>,
}

/// A named configuration entry on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
  #[serde(alias = "key")]
  pub name: String,
  #[serde(default)]
  pub value: Value,
}

impl NodeDef {
  /// Get the structured input entry with the given name.
  pub fn input(&self, name: &str) -> Option<&Value> {
    self
      .inputs
      .iter()
      .find(|input| input.name == name)
      .map(|input| &input.value)
  }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Ok(Option::<Map<String, Value>>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_default<'de, D>(deserializer: D) -> Result<Vec<NodeInput>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Ok(Option::<Vec<NodeInput>>::deserialize(deserializer)?.unwrap_or_default())
}
