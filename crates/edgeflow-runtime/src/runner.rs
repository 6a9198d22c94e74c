//! Trigger runner with channel-based triggering.
//!
//! The `TriggerRunner` owns an mpsc channel of [`TriggerRequest`]s. Trigger
//! sources (webhooks, manual invocations, schedules) hold a
//! [`TriggerHandle`]; each request runs as its own task, so independent runs
//! proceed concurrently.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::WorkflowEngine;
use crate::error::RuntimeError;
use crate::input::Bag;

/// A request to run a workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerRequest {
  pub execution_id: String,
  pub workflow_id: String,
  pub parameters: Bag,
}

/// Sending side of a [`TriggerRunner`].
#[derive(Debug, Clone)]
pub struct TriggerHandle {
  sender: mpsc::Sender<TriggerRequest>,
}

impl TriggerHandle {
  /// Queue a run with a fresh execution id and return that id.
  pub async fn trigger(
    &self,
    workflow_id: impl Into<String>,
    parameters: Bag,
  ) -> Result<String, RuntimeError> {
    let execution_id = uuid::Uuid::new_v4().to_string();
    self
      .send(TriggerRequest {
        execution_id: execution_id.clone(),
        workflow_id: workflow_id.into(),
        parameters,
      })
      .await?;
    Ok(execution_id)
  }

  /// Queue a run with a caller-chosen execution id.
  pub async fn send(&self, request: TriggerRequest) -> Result<(), RuntimeError> {
    self
      .sender
      .send(request)
      .await
      .map_err(|_| RuntimeError::ChannelClosed)
  }
}

/// Executes workflow runs in response to trigger requests.
///
/// # Usage
///
/// ```ignore
/// let runner = TriggerRunner::new(engine);
///
/// // Give handles to trigger sources
/// let handle = runner.handle();
///
/// // Start the loop
/// let cancel = CancellationToken::new();
/// tokio::spawn(runner.start(cancel.clone()));
///
/// let execution_id = handle.trigger("wf-1", parameters).await?;
/// ```
pub struct TriggerRunner {
  sender: mpsc::Sender<TriggerRequest>,
  receiver: mpsc::Receiver<TriggerRequest>,
  engine: Arc<WorkflowEngine>,
}

impl TriggerRunner {
  pub fn new(engine: Arc<WorkflowEngine>) -> Self {
    Self::with_buffer_size(engine, 100)
  }

  /// Create a runner with a custom channel buffer size.
  pub fn with_buffer_size(engine: Arc<WorkflowEngine>, buffer_size: usize) -> Self {
    let (sender, receiver) = mpsc::channel(buffer_size);
    Self {
      sender,
      receiver,
      engine,
    }
  }

  /// Get a handle for triggering runs.
  pub fn handle(&self) -> TriggerHandle {
    TriggerHandle {
      sender: self.sender.clone(),
    }
  }

  pub fn engine(&self) -> &Arc<WorkflowEngine> {
    &self.engine
  }

  /// Run the trigger loop.
  ///
  /// Returns once the token is cancelled or every handle has been dropped,
  /// after in-flight runs have finished. Each run gets a child token of
  /// `cancel`.
  pub async fn start(self, cancel: CancellationToken) {
    let Self {
      sender,
      mut receiver,
      engine,
    } = self;
    // Only handles keep the channel open.
    drop(sender);

    let mut runs = JoinSet::new();
    info!("starting trigger runner");

    loop {
      tokio::select! {
        _ = cancel.cancelled() => {
          info!("trigger runner cancelled");
          break;
        }
        request = receiver.recv() => {
          let Some(request) = request else {
            info!("trigger runner channel closed");
            break;
          };

          info!(
            workflow_id = %request.workflow_id,
            execution_id = %request.execution_id,
            "triggering workflow execution"
          );

          let engine = engine.clone();
          let run_cancel = cancel.child_token();
          runs.spawn(async move {
            let outcome = engine
              .execute_workflow(
                &request.workflow_id,
                &request.execution_id,
                request.parameters,
                run_cancel,
              )
              .await;
            info!(
              workflow_id = %outcome.workflow_id,
              execution_id = %outcome.execution_id,
              status = ?outcome.status,
              "workflow execution finished"
            );
          });
        }
        Some(joined) = runs.join_next(), if !runs.is_empty() => {
          if let Err(e) = joined {
            error!(error = %e, "workflow execution task failed");
          }
        }
      }
    }

    while let Some(joined) = runs.join_next().await {
      if let Err(e) = joined {
        error!(error = %e, "workflow execution task failed");
      }
    }
  }
}
