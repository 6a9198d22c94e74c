//! Run progress events.
//!
//! The coordinator reports each state transition of a run as an
//! [`ExecutionEvent`]. Events carry the same information the run store
//! receives, but arrive as they happen, and include the readiness checks that
//! the store never sees (`DependencySatisfied`).

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// A transition in a workflow run.
///
/// Serialized with an `event` tag, e.g.
/// `{"event":"node_started","execution_id":"..","node_id":"fetch"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  WorkflowStarted {
    execution_id: String,
    workflow_id: String,
  },

  /// `node_id` was dequeued and its handler is about to run.
  NodeStarted {
    execution_id: String,
    node_id: String,
  },

  /// The handler returned; `outputs` is the bag stored for this node.
  NodeCompleted {
    execution_id: String,
    node_id: String,
    outputs: serde_json::Value,
  },

  /// The handler returned an error. The run ends after this event.
  NodeFailed {
    execution_id: String,
    node_id: String,
    error: String,
  },

  /// `upstream_id` completed and fed `node_id`. `remaining` counts the
  /// upstream nodes of `node_id` still outstanding; at zero it is queued.
  DependencySatisfied {
    execution_id: String,
    node_id: String,
    upstream_id: String,
    remaining: usize,
  },

  WorkflowCompleted { execution_id: String },

  /// The run ended in `error`. Also sent for runs rejected at load.
  WorkflowFailed { execution_id: String, error: String },
}

impl ExecutionEvent {
  /// The run this event belongs to.
  pub fn execution_id(&self) -> &str {
    match self {
      Self::WorkflowStarted { execution_id, .. }
      | Self::NodeStarted { execution_id, .. }
      | Self::NodeCompleted { execution_id, .. }
      | Self::NodeFailed { execution_id, .. }
      | Self::DependencySatisfied { execution_id, .. }
      | Self::WorkflowCompleted { execution_id }
      | Self::WorkflowFailed { execution_id, .. } => execution_id,
    }
  }

  /// The node this event is about, if any.
  pub fn node_id(&self) -> Option<&str> {
    match self {
      Self::NodeStarted { node_id, .. }
      | Self::NodeCompleted { node_id, .. }
      | Self::NodeFailed { node_id, .. }
      | Self::DependencySatisfied { node_id, .. } => Some(node_id),
      Self::WorkflowStarted { .. } | Self::WorkflowCompleted { .. } | Self::WorkflowFailed { .. } => {
        None
      }
    }
  }
}

/// Receives the events of every run a [`Runtime`](crate::Runtime) executes.
///
/// `notify` is called inline on the run's task and must not block.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards events. The runtime's default.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded: a run never waits on its observer.
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    if let Err(mpsc::error::SendError(event)) = self.sender.send(event) {
      trace!(execution_id = %event.execution_id(), "event receiver dropped");
    }
  }
}
