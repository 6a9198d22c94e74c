//! Runtime error types.

use edgeflow_config::ConfigError;
use edgeflow_host_http::HttpError;
use edgeflow_store::StoreError;
use edgeflow_workflow::WorkflowError;

/// Errors that can occur during runtime execution.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
  /// Execution was cancelled.
  #[error("execution cancelled")]
  Cancelled,

  /// The workflow definition could not be parsed.
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// The workflow graph is structurally invalid.
  #[error(transparent)]
  Workflow(#[from] WorkflowError),

  /// Nodes were left unscheduled after the ready queue drained.
  #[error("invalid graph: {message}")]
  InvalidGraph { message: String },

  /// Reading from or writing to the run store failed.
  #[error(transparent)]
  Store(#[from] StoreError),

  /// An HTTP request failed at the transport level.
  #[error(transparent)]
  Http(#[from] HttpError),

  /// A node is missing a required configuration field.
  #[error("node '{node_id}' is missing required field '{field}'")]
  MissingConfig { node_id: String, field: String },

  /// A templated configuration value failed to render.
  #[error("failed to resolve field '{field}' of node '{node_id}': {message}")]
  Template {
    node_id: String,
    field: String,
    message: String,
  },

  /// An expression failed to compile or evaluate.
  #[error("expression failed: {message}")]
  Expression { message: String },

  /// The trigger runner is no longer accepting requests.
  #[error("trigger channel closed")]
  ChannelClosed,
}
