//! Per-run execution state.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::Utc;
use edgeflow_store::{ExecutionStatus, ExecutionUpdate, NodeExecution, NodeStatus};
use edgeflow_workflow::Workflow;
use serde_json::{Value, json};

use crate::input::Bag;

/// State of a single run: trigger parameters, node outputs and the ordered
/// per-node execution records.
///
/// Each node is executed at most once; [`ExecutionContext::mark_executing`]
/// refuses a node that has already been started.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
  pub execution_id: String,
  pub workflow_id: String,
  pub parameters: Bag,
  node_outputs: HashMap<String, Bag>,
  node_executions: Vec<NodeExecution>,
  index: HashMap<String, usize>,
  executed: HashSet<String>,
}

impl ExecutionContext {
  /// Create the context of a new run with every node idle.
  pub fn new(execution_id: impl Into<String>, workflow: &Workflow, parameters: Bag) -> Self {
    let node_executions: Vec<NodeExecution> = workflow
      .nodes()
      .iter()
      .map(|node| NodeExecution::idle(&node.id))
      .collect();
    let index = node_executions
      .iter()
      .enumerate()
      .map(|(i, n)| (n.node_id.clone(), i))
      .collect();

    Self {
      execution_id: execution_id.into(),
      workflow_id: workflow.workflow_id.clone(),
      parameters,
      node_outputs: HashMap::new(),
      node_executions,
      index,
      executed: HashSet::new(),
    }
  }

  /// Outputs of completed nodes, keyed by node id.
  pub fn node_outputs(&self) -> &HashMap<String, Bag> {
    &self.node_outputs
  }

  /// Execution records in node definition order.
  pub fn node_executions(&self) -> &[NodeExecution] {
    &self.node_executions
  }

  pub fn node_execution(&self, node_id: &str) -> Option<&NodeExecution> {
    self.index.get(node_id).map(|i| &self.node_executions[*i])
  }

  /// Whether the node has been started in this run.
  pub fn is_executed(&self, node_id: &str) -> bool {
    self.executed.contains(node_id)
  }

  /// Nodes started in this run.
  pub fn executed(&self) -> &HashSet<String> {
    &self.executed
  }

  /// Mark a node as executing. Returns false if it was already started.
  pub fn mark_executing(&mut self, node_id: &str) -> bool {
    if !self.executed.insert(node_id.to_string()) {
      return false;
    }
    if let Some(record) = self.record_mut(node_id) {
      record.status = NodeStatus::Executing;
    }
    true
  }

  pub fn mark_completed(&mut self, node_id: &str, outputs: Bag, elapsed: Duration) {
    if let Some(record) = self.record_mut(node_id) {
      record.status = NodeStatus::Completed;
      record.outputs = Some(Value::Object(outputs.clone()));
      record.error = None;
      record.usage = Some(usage(elapsed));
    }
    self.node_outputs.insert(node_id.to_string(), outputs);
  }

  pub fn mark_failed(&mut self, node_id: &str, error: &str, elapsed: Duration) {
    if let Some(record) = self.record_mut(node_id) {
      record.status = NodeStatus::Error;
      record.error = Some(error.to_string());
      record.usage = Some(usage(elapsed));
    }
  }

  /// Outputs of the completed terminal nodes, keyed by node id.
  pub fn result(&self, terminal_nodes: &[String]) -> Value {
    let result: Bag = terminal_nodes
      .iter()
      .filter_map(|id| {
        self
          .node_outputs
          .get(id)
          .map(|outputs| (id.clone(), Value::Object(outputs.clone())))
      })
      .collect();
    Value::Object(result)
  }

  /// Snapshot of the run for the store. `ended_at` is set for terminal states.
  pub fn update(
    &self,
    status: ExecutionStatus,
    result: Option<Value>,
    error: Option<String>,
  ) -> ExecutionUpdate {
    ExecutionUpdate {
      workflow_id: self.workflow_id.clone(),
      status,
      node_executions: self.node_executions.clone(),
      result,
      error,
      ended_at: status.is_terminal().then(Utc::now),
    }
  }

  fn record_mut(&mut self, node_id: &str) -> Option<&mut NodeExecution> {
    let i = *self.index.get(node_id)?;
    self.node_executions.get_mut(i)
  }
}

fn usage(elapsed: Duration) -> Value {
  json!({ "duration_ms": elapsed.as_millis() as u64 })
}

#[cfg(test)]
mod tests {
  use super::*;
  use edgeflow_config::WorkflowDef;

  fn workflow() -> Workflow {
    let def = WorkflowDef::from_parts(
      "wf",
      "Test",
      &json!([
        { "id": "a", "type": "trigger" },
        { "id": "b", "type": "log" },
        { "id": "c", "type": "log" }
      ]),
      &json!([
        { "source": "a", "target": "b" },
        { "source": "a", "target": "c" }
      ]),
    )
    .unwrap();
    Workflow::from_def(def).unwrap()
  }

  #[test]
  fn test_all_nodes_start_idle() {
    let ctx = ExecutionContext::new("exec-1", &workflow(), Bag::new());

    let ids: Vec<_> = ctx.node_executions().iter().map(|n| n.node_id.as_str()).collect();
    assert_eq!(ids, ["a", "b", "c"]);
    assert!(ctx
      .node_executions()
      .iter()
      .all(|n| n.status == NodeStatus::Idle));
  }

  #[test]
  fn test_node_runs_at_most_once() {
    let mut ctx = ExecutionContext::new("exec-1", &workflow(), Bag::new());

    assert!(ctx.mark_executing("a"));
    assert!(!ctx.mark_executing("a"));
    assert_eq!(ctx.node_execution("a").unwrap().status, NodeStatus::Executing);
  }

  #[test]
  fn test_executed_tracks_started_nodes() {
    let workflow = workflow();
    let mut ctx = ExecutionContext::new("exec-1", &workflow, Bag::new());
    assert!(!workflow.graph().is_ready("b", ctx.executed()));

    ctx.mark_executing("a");

    assert!(ctx.executed().contains("a"));
    assert!(workflow.graph().is_ready("b", ctx.executed()));
  }

  #[test]
  fn test_completed_and_failed_records() {
    let mut ctx = ExecutionContext::new("exec-1", &workflow(), Bag::new());
    let mut outputs = Bag::new();
    outputs.insert("x".to_string(), json!(1));

    ctx.mark_executing("a");
    ctx.mark_completed("a", outputs, Duration::from_millis(12));
    ctx.mark_executing("b");
    ctx.mark_failed("b", "boom", Duration::from_millis(3));

    let a = ctx.node_execution("a").unwrap();
    assert_eq!(a.status, NodeStatus::Completed);
    assert_eq!(a.outputs, Some(json!({ "x": 1 })));
    assert_eq!(a.usage, Some(json!({ "duration_ms": 12 })));

    let b = ctx.node_execution("b").unwrap();
    assert_eq!(b.status, NodeStatus::Error);
    assert_eq!(b.error.as_deref(), Some("boom"));
    assert_eq!(b.outputs, None);
  }

  #[test]
  fn test_result_holds_completed_terminals() {
    let workflow = workflow();
    let mut ctx = ExecutionContext::new("exec-1", &workflow, Bag::new());
    let mut outputs = Bag::new();
    outputs.insert("logged".to_string(), json!(true));
    ctx.mark_completed("b", outputs, Duration::ZERO);

    let result = ctx.result(workflow.graph().terminal_nodes());

    assert_eq!(result, json!({ "b": { "logged": true } }));
  }

  #[test]
  fn test_update_sets_ended_at_on_terminal() {
    let ctx = ExecutionContext::new("exec-1", &workflow(), Bag::new());

    assert!(ctx.update(ExecutionStatus::Executing, None, None).ended_at.is_none());
    assert!(ctx.update(ExecutionStatus::Completed, None, None).ended_at.is_some());
  }
}
