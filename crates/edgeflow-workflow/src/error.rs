use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
  #[error("node not found: {0}")]
  NodeNotFound(String),

  #[error("duplicate node id: {0}")]
  DuplicateNode(String),

  #[error("workflow graph contains a cycle through nodes: {}", nodes.join(", "))]
  Cycle { nodes: Vec<String> },
}
