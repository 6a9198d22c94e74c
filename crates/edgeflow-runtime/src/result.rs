//! Execution result types.

use edgeflow_store::{ExecutionStatus, NodeExecution};
use serde::{Deserialize, Serialize};

/// Final state of a run. Mirrors the last record written to the run store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutcome {
  pub execution_id: String,
  pub workflow_id: String,
  pub status: ExecutionStatus,
  pub node_executions: Vec<NodeExecution>,
  /// Outputs of the terminal nodes keyed by node id. Set on completion.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub result: Option<serde_json::Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl RunOutcome {
  pub fn is_completed(&self) -> bool {
    self.status == ExecutionStatus::Completed
  }

  /// Get the execution record of a node.
  pub fn node(&self, node_id: &str) -> Option<&NodeExecution> {
    self.node_executions.iter().find(|n| n.node_id == node_id)
  }

  /// Get the outputs of a completed node.
  pub fn output(&self, node_id: &str) -> Option<&serde_json::Value> {
    self.node(node_id).and_then(|n| n.outputs.as_ref())
  }
}
