//! Workflow runtime.
//!
//! The [`Runtime`] drives a single run of a validated [`Workflow`]. It keeps a
//! live count of unsatisfied dependencies per node, runs nodes from a FIFO
//! ready queue one at a time, and persists every status transition to the
//! run store. `invoke(workflow, execution_id, parameters, cancel)` always
//! returns a [`RunOutcome`]; failures are recorded, never returned.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use edgeflow_host_http::HttpClient;
use edgeflow_store::{ExecutionStatus, ExecutionUpdate, RunStore};
use edgeflow_workflow::Workflow;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::config::RuntimeConfig;
use crate::context::ExecutionContext;
use crate::error::RuntimeError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::handlers::Dispatcher;
use crate::input::{Bag, resolve_inputs};
use crate::query::{DataQueryService, HttpDataQueryService};
use crate::result::RunOutcome;

/// The workflow runtime.
///
/// Handles scheduling, input resolution and state persistence, and hands each
/// node to the [`Dispatcher`].
pub struct Runtime {
  dispatcher: Dispatcher,
  store: Arc<dyn RunStore>,
  notifier: Arc<dyn ExecutionNotifier>,
}

impl Runtime {
  /// Create a runtime. `data_request` nodes query `config.data_query_url`
  /// through the same HTTP client used by `http_request` nodes.
  pub fn new(config: &RuntimeConfig, http: Arc<dyn HttpClient>, store: Arc<dyn RunStore>) -> Self {
    let data_query = Arc::new(HttpDataQueryService::new(
      http.clone(),
      config.data_query_url.clone(),
    ));

    Self {
      dispatcher: Dispatcher::new(http, data_query, config.http_failure_mode),
      store,
      notifier: Arc::new(NoopNotifier),
    }
  }

  /// Replace the data-query service used by `data_request` nodes.
  pub fn with_data_query_service(mut self, data_query: Arc<dyn DataQueryService>) -> Self {
    self.dispatcher = self.dispatcher.with_data_query_service(data_query);
    self
  }

  /// Set the notifier receiving execution events.
  pub fn with_notifier(mut self, notifier: Arc<dyn ExecutionNotifier>) -> Self {
    self.notifier = notifier;
    self
  }

  pub fn store(&self) -> &Arc<dyn RunStore> {
    &self.store
  }

  pub fn dispatcher(&self) -> &Dispatcher {
    &self.dispatcher
  }

  /// Execute the workflow with the given trigger parameters.
  #[instrument(
    name = "runtime_invoke",
    skip(self, workflow, parameters, cancel),
    fields(workflow_id = %workflow.workflow_id, execution_id = %execution_id)
  )]
  pub async fn invoke(
    &self,
    workflow: &Workflow,
    execution_id: &str,
    parameters: Bag,
    cancel: CancellationToken,
  ) -> RunOutcome {
    let mut ctx = ExecutionContext::new(execution_id, workflow, parameters);

    info!(
      execution_id = %execution_id,
      workflow_id = %workflow.workflow_id,
      nodes = workflow.nodes().len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.to_string(),
      workflow_id: workflow.workflow_id.clone(),
    });
    self
      .persist(execution_id, &ctx.update(ExecutionStatus::Executing, None, None))
      .await;

    match self.run_execution_loop(workflow, &mut ctx, &cancel).await {
      Ok(()) => {
        let result = ctx.result(workflow.graph().terminal_nodes());
        info!(execution_id = %execution_id, "workflow_completed");
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: execution_id.to_string(),
        });
        self
          .finish(&ctx, ctx.update(ExecutionStatus::Completed, Some(result), None))
          .await
      }
      Err(e) => {
        let message = e.to_string();
        error!(execution_id = %execution_id, error = %message, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.to_string(),
          error: message.clone(),
        });
        self
          .finish(&ctx, ctx.update(ExecutionStatus::Error, None, Some(message)))
          .await
      }
    }
  }

  /// Execute a single node in isolation with a caller-supplied input bag.
  ///
  /// This is for debugging. Nothing is persisted and no events are emitted.
  #[instrument(
    name = "runtime_invoke_node",
    skip(self, workflow, inputs),
    fields(workflow_id = %workflow.workflow_id, node_id = %node_id)
  )]
  pub async fn invoke_node(
    &self,
    workflow: &Workflow,
    node_id: &str,
    inputs: Bag,
  ) -> Result<Bag, RuntimeError> {
    let node = workflow.node(node_id)?;

    info!(node_id = %node_id, node_type = %node.node_type, "invoke_node_started");

    let result = self.dispatcher.dispatch(node, inputs).await;

    match &result {
      Ok(outputs) => {
        info!(node_id = %node_id, outputs = outputs.len(), "invoke_node_completed");
      }
      Err(e) => {
        error!(node_id = %node_id, error = %e, "invoke_node_failed");
      }
    }

    result
  }

  /// Record a run that failed before any node could execute.
  pub async fn fail_run(&self, workflow_id: &str, execution_id: &str, error: &str) -> RunOutcome {
    error!(
      execution_id = %execution_id,
      workflow_id = %workflow_id,
      error = %error,
      "workflow_failed"
    );
    self.notifier.notify(ExecutionEvent::WorkflowFailed {
      execution_id: execution_id.to_string(),
      error: error.to_string(),
    });

    let update = ExecutionUpdate {
      workflow_id: workflow_id.to_string(),
      status: ExecutionStatus::Error,
      node_executions: Vec::new(),
      result: None,
      error: Some(error.to_string()),
      ended_at: Some(chrono::Utc::now()),
    };
    self.persist(execution_id, &update).await;

    RunOutcome {
      execution_id: execution_id.to_string(),
      workflow_id: update.workflow_id,
      status: update.status,
      node_executions: update.node_executions,
      result: update.result,
      error: update.error,
    }
  }

  /// Run nodes until the ready queue drains.
  async fn run_execution_loop(
    &self,
    workflow: &Workflow,
    ctx: &mut ExecutionContext,
    cancel: &CancellationToken,
  ) -> Result<(), RuntimeError> {
    let graph = workflow.graph();
    let mut pending: HashMap<String, usize> = graph.dependency_counts();
    let mut ready: VecDeque<String> = graph.start_nodes().iter().cloned().collect();
    let execution_id = ctx.execution_id.clone();

    while let Some(node_id) = ready.pop_front() {
      if cancel.is_cancelled() {
        warn!(execution_id = %execution_id, "workflow cancelled");
        return Err(RuntimeError::Cancelled);
      }

      debug_assert!(
        graph.is_ready(&node_id, ctx.executed()),
        "node '{}' queued before all of its upstream nodes ran",
        node_id
      );
      if !ctx.mark_executing(&node_id) {
        continue;
      }

      let node = workflow.node(&node_id)?;
      self
        .persist(&execution_id, &ctx.update(ExecutionStatus::Executing, None, None))
        .await;
      self.notifier.notify(ExecutionEvent::NodeStarted {
        execution_id: execution_id.clone(),
        node_id: node_id.clone(),
      });

      let inputs = resolve_inputs(graph, &node_id, ctx.node_outputs(), &ctx.parameters);

      info!(
        execution_id = %execution_id,
        node_id = %node_id,
        node_type = %node.node_type,
        "task_started"
      );

      let started = Instant::now();
      let result = tokio::select! {
        result = self.dispatcher.dispatch(node, inputs) => result,
        _ = cancel.cancelled() => {
          warn!(execution_id = %execution_id, node_id = %node_id, "workflow cancelled during task execution");
          Err(RuntimeError::Cancelled)
        }
      };
      let elapsed = started.elapsed();

      let outputs = match result {
        Ok(outputs) => outputs,
        Err(e) => {
          let message = e.to_string();
          error!(
            execution_id = %execution_id,
            node_id = %node_id,
            error = %message,
            "task_failed"
          );
          ctx.mark_failed(&node_id, &message, elapsed);
          self.notifier.notify(ExecutionEvent::NodeFailed {
            execution_id: execution_id.clone(),
            node_id: node_id.clone(),
            error: message,
          });
          return Err(e);
        }
      };

      info!(
        execution_id = %execution_id,
        node_id = %node_id,
        duration_ms = elapsed.as_millis() as u64,
        "task_completed"
      );
      self.notifier.notify(ExecutionEvent::NodeCompleted {
        execution_id: execution_id.clone(),
        node_id: node_id.clone(),
        outputs: serde_json::Value::Object(outputs.clone()),
      });
      ctx.mark_completed(&node_id, outputs, elapsed);
      self
        .persist(&execution_id, &ctx.update(ExecutionStatus::Executing, None, None))
        .await;

      for next in graph.downstream(&node_id) {
        let Some(count) = pending.get_mut(next) else {
          continue;
        };
        *count = count.saturating_sub(1);

        debug!(
          execution_id = %execution_id,
          node_id = %next,
          upstream_id = %node_id,
          remaining = *count,
          "dependency satisfied"
        );
        self.notifier.notify(ExecutionEvent::DependencySatisfied {
          execution_id: execution_id.clone(),
          node_id: next.clone(),
          upstream_id: node_id.clone(),
          remaining: *count,
        });

        if *count == 0 {
          ready.push_back(next.clone());
        }
      }
    }

    let unscheduled: Vec<&str> = workflow
      .nodes()
      .iter()
      .map(|node| node.id.as_str())
      .filter(|id| !ctx.is_executed(id))
      .collect();

    if !unscheduled.is_empty() {
      return Err(RuntimeError::InvalidGraph {
        message: format!("nodes never became ready: {}", unscheduled.join(", ")),
      });
    }

    Ok(())
  }

  /// Persist the final state and build the outcome from it.
  async fn finish(&self, ctx: &ExecutionContext, update: ExecutionUpdate) -> RunOutcome {
    self.persist(&ctx.execution_id, &update).await;

    RunOutcome {
      execution_id: ctx.execution_id.clone(),
      workflow_id: update.workflow_id,
      status: update.status,
      node_executions: update.node_executions,
      result: update.result,
      error: update.error,
    }
  }

  /// Write run state. Store failures are logged and do not affect the run.
  async fn persist(&self, execution_id: &str, update: &ExecutionUpdate) {
    if let Err(e) = self.store.update_execution(execution_id, update).await {
      error!(
        execution_id = %execution_id,
        status = ?update.status,
        error = %e,
        "failed to persist execution state"
      );
    }
  }
}
