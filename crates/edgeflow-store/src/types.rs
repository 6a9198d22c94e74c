use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

/// Status of a workflow execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ExecutionStatus {
  Executing,
  Completed,
  Error,
}

impl ExecutionStatus {
  pub fn is_terminal(self) -> bool {
    !matches!(self, Self::Executing)
  }
}

/// Status of a single node within an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
  Idle,
  Executing,
  Completed,
  Error,
}

/// Per-node execution record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecution {
  pub node_id: String,
  pub status: NodeStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub outputs: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub usage: Option<serde_json::Value>,
}

impl NodeExecution {
  pub fn idle(node_id: impl Into<String>) -> Self {
    Self {
      node_id: node_id.into(),
      status: NodeStatus::Idle,
      outputs: None,
      error: None,
      usage: None,
    }
  }
}

/// State written by the runtime on each transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionUpdate {
  pub workflow_id: String,
  pub status: ExecutionStatus,
  pub node_executions: Vec<NodeExecution>,
  pub result: Option<serde_json::Value>,
  pub error: Option<String>,
  pub ended_at: Option<DateTime<Utc>>,
}

/// An execution as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ExecutionRecord {
  pub execution_id: String,
  pub workflow_id: String,
  pub status: ExecutionStatus,
  pub node_executions: Json<Vec<NodeExecution>>,
  pub result: Option<Json<serde_json::Value>>,
  pub error: Option<String>,
  pub ended_at: Option<DateTime<Utc>>,
  pub updated_at: DateTime<Utc>,
}

impl ExecutionRecord {
  pub fn from_update(execution_id: &str, update: &ExecutionUpdate, updated_at: DateTime<Utc>) -> Self {
    Self {
      execution_id: execution_id.to_string(),
      workflow_id: update.workflow_id.clone(),
      status: update.status,
      node_executions: Json(update.node_executions.clone()),
      result: update.result.clone().map(Json),
      error: update.error.clone(),
      ended_at: update.ended_at,
      updated_at,
    }
  }

  /// Get the execution record of a node.
  pub fn node(&self, node_id: &str) -> Option<&NodeExecution> {
    self.node_executions.iter().find(|n| n.node_id == node_id)
  }
}

/// A workflow definition as stored. `nodes` and `edges` are opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct WorkflowRecord {
  pub workflow_id: String,
  pub name: String,
  pub nodes: Json<serde_json::Value>,
  pub edges: Json<serde_json::Value>,
}

impl WorkflowRecord {
  pub fn new(
    workflow_id: impl Into<String>,
    name: impl Into<String>,
    nodes: serde_json::Value,
    edges: serde_json::Value,
  ) -> Self {
    Self {
      workflow_id: workflow_id.into(),
      name: name.into(),
      nodes: Json(nodes),
      edges: Json(edges),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_node_execution_wire_shape() {
    let mut node = NodeExecution::idle("fetch");
    node.status = NodeStatus::Completed;
    node.outputs = Some(json!({ "rowCount": 1 }));

    let value = serde_json::to_value(&node).unwrap();

    assert_eq!(
      value,
      json!({ "nodeId": "fetch", "status": "completed", "outputs": { "rowCount": 1 } })
    );
  }

  #[test]
  fn test_terminal_statuses() {
    assert!(!ExecutionStatus::Executing.is_terminal());
    assert!(ExecutionStatus::Completed.is_terminal());
    assert!(ExecutionStatus::Error.is_terminal());
  }
}
