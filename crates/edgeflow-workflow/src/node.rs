use edgeflow_config::NodeDef;
use serde_json::{Map, Value};

/// Handler selected by a node's type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
  /// `trigger`, `manual_trigger`
  Trigger,
  /// `data_request`
  DataRequest,
  /// `http_request`
  HttpRequest,
  /// `transform`, `json_transform`
  Transform,
  /// `condition`, `if`
  Condition,
  /// `log`, `console`
  Log,
  /// Any other tag. Executed as a passthrough.
  Custom(String),
}

impl NodeKind {
  pub fn from_type(tag: &str) -> Self {
    match tag {
      "trigger" | "manual_trigger" => Self::Trigger,
      "data_request" => Self::DataRequest,
      "http_request" => Self::HttpRequest,
      "transform" | "json_transform" => Self::Transform,
      "condition" | "if" => Self::Condition,
      "log" | "console" => Self::Log,
      other => Self::Custom(other.to_string()),
    }
  }
}

/// A node of a validated workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
  pub id: String,
  /// The type tag as authored.
  pub node_type: String,
  pub kind: NodeKind,
  pub data: Map<String, Value>,
  pub inputs: Vec<(String, Value)>,
}

impl Node {
  /// Get the structured input entry with the given name.
  pub fn input(&self, name: &str) -> Option<&Value> {
    self
      .inputs
      .iter()
      .find(|(key, _)| key == name)
      .map(|(_, value)| value)
  }
}

impl From<NodeDef> for Node {
  fn from(def: NodeDef) -> Self {
    Self {
      kind: NodeKind::from_type(&def.node_type),
      id: def.id,
      node_type: def.node_type,
      data: def.data,
      inputs: def
        .inputs
        .into_iter()
        .map(|input| (input.name, input.value))
        .collect(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_kind_aliases() {
    assert_eq!(NodeKind::from_type("trigger"), NodeKind::Trigger);
    assert_eq!(NodeKind::from_type("manual_trigger"), NodeKind::Trigger);
    assert_eq!(NodeKind::from_type("json_transform"), NodeKind::Transform);
    assert_eq!(NodeKind::from_type("if"), NodeKind::Condition);
    assert_eq!(NodeKind::from_type("console"), NodeKind::Log);
    assert_eq!(
      NodeKind::from_type("send_email"),
      NodeKind::Custom("send_email".to_string())
    );
  }
}
