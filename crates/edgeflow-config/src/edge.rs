use serde::{Deserialize, Serialize};

/// A directed data-flow connection between two nodes.
///
/// `source_output` names the field of the source node's output that is read,
/// `target_input` names the field of the target node's input bag it lands in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDef {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id: Option<String>,
  pub source: String,
  pub target: String,
  #[serde(default, alias = "sourceHandle", skip_serializing_if = "Option::is_none")]
  pub source_output: Option<String>,
  #[serde(default, alias = "targetHandle", skip_serializing_if = "Option::is_none")]
  pub target_input: Option<String>,
}
