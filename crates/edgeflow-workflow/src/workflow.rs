use std::collections::HashMap;

use edgeflow_config::WorkflowDef;

use crate::error::WorkflowError;
use crate::graph::{Edge, Graph};
use crate::node::Node;

/// A validated workflow ready for execution.
#[derive(Debug, Clone)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: String,
  nodes: Vec<Node>,
  index: HashMap<String, usize>,
  graph: Graph,
}

impl Workflow {
  /// Validate a definition into a runnable workflow.
  pub fn from_def(def: WorkflowDef) -> Result<Self, WorkflowError> {
    let mut nodes = Vec::with_capacity(def.nodes.len());
    let mut index = HashMap::with_capacity(def.nodes.len());

    for node_def in def.nodes {
      if index.contains_key(&node_def.id) {
        return Err(WorkflowError::DuplicateNode(node_def.id));
      }
      index.insert(node_def.id.clone(), nodes.len());
      nodes.push(Node::from(node_def));
    }

    let edges = def
      .edges
      .into_iter()
      .map(|edge| Edge {
        source: edge.source,
        target: edge.target,
        source_output: edge.source_output,
        target_input: edge.target_input,
      })
      .collect();

    let node_ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let graph = Graph::new(&node_ids, edges);
    graph.validate()?;

    Ok(Self {
      workflow_id: def.workflow_id,
      name: def.name,
      nodes,
      index,
      graph,
    })
  }

  /// The dependency graph.
  pub fn graph(&self) -> &Graph {
    &self.graph
  }

  /// Nodes in definition order.
  pub fn nodes(&self) -> &[Node] {
    &self.nodes
  }

  /// Get a node by ID.
  pub fn get_node(&self, node_id: &str) -> Option<&Node> {
    self.index.get(node_id).map(|i| &self.nodes[*i])
  }

  /// Get a node by ID, or fail.
  pub fn node(&self, node_id: &str) -> Result<&Node, WorkflowError> {
    self
      .get_node(node_id)
      .ok_or_else(|| WorkflowError::NodeNotFound(node_id.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::NodeKind;
  use serde_json::json;

  fn def(nodes: serde_json::Value, edges: serde_json::Value) -> WorkflowDef {
    WorkflowDef::from_parts("wf", "Test", &nodes, &edges).unwrap()
  }

  #[test]
  fn test_from_def() {
    let workflow = Workflow::from_def(def(
      json!([
        { "id": "t", "type": "trigger" },
        { "id": "h", "type": "http_request", "data": { "url": "https://example.com" } }
      ]),
      json!([{ "source": "t", "target": "h" }]),
    ))
    .unwrap();

    assert_eq!(workflow.nodes().len(), 2);
    assert_eq!(workflow.node("h").unwrap().kind, NodeKind::HttpRequest);
    assert_eq!(workflow.graph().start_nodes(), &["t".to_string()]);
    assert!(workflow.get_node("missing").is_none());
  }

  #[test]
  fn test_duplicate_node_rejected() {
    let result = Workflow::from_def(def(
      json!([{ "id": "a", "type": "log" }, { "id": "a", "type": "log" }]),
      json!([]),
    ));

    assert!(matches!(result, Err(WorkflowError::DuplicateNode(id)) if id == "a"));
  }

  #[test]
  fn test_cycle_rejected() {
    let result = Workflow::from_def(def(
      json!([{ "id": "a", "type": "log" }, { "id": "b", "type": "log" }]),
      json!([{ "source": "a", "target": "b" }, { "source": "b", "target": "a" }]),
    ));

    assert!(matches!(result, Err(WorkflowError::Cycle { .. })));
  }

  #[test]
  fn test_structured_inputs_carried() {
    let workflow = Workflow::from_def(def(
      json!([{ "id": "d", "type": "data_request", "inputs": [{ "name": "table", "value": "users" }] }]),
      json!([]),
    ))
    .unwrap();

    assert_eq!(workflow.node("d").unwrap().input("table"), Some(&json!("users")));
  }
}
