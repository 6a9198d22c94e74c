use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid node list: {message}")]
  InvalidNodes { message: String },

  #[error("invalid edge list: {message}")]
  InvalidEdges { message: String },

  #[error("invalid workflow definition: {0}")]
  InvalidWorkflow(#[from] serde_json::Error),
}
