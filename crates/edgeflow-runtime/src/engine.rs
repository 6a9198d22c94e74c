//! Workflow execution engine.
//!
//! The `WorkflowEngine` is the "execute workflow" entry point used by trigger
//! sources. It loads the workflow definition from the run store (through a
//! TTL cache), validates it, and hands it to the [`Runtime`].

use std::sync::Arc;

use edgeflow_config::WorkflowDef;
use edgeflow_store::RunStore;
use edgeflow_workflow::Workflow;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, instrument};

use crate::cache::TtlCache;
use crate::config::RuntimeConfig;
use crate::error::RuntimeError;
use crate::input::Bag;
use crate::result::RunOutcome;
use crate::runtime::Runtime;

/// Loads workflows and runs them.
pub struct WorkflowEngine {
  store: Arc<dyn RunStore>,
  runtime: Arc<Runtime>,
  cache: TtlCache<String, Arc<Workflow>>,
}

impl WorkflowEngine {
  /// Create an engine reading definitions from the runtime's store.
  pub fn new(runtime: Arc<Runtime>, cache: TtlCache<String, Arc<Workflow>>) -> Self {
    Self {
      store: runtime.store().clone(),
      runtime,
      cache,
    }
  }

  /// Create an engine whose cache keeps definitions for
  /// `config.workflow_cache_ttl`.
  pub fn from_config(runtime: Arc<Runtime>, config: &RuntimeConfig) -> Self {
    Self::new(runtime, TtlCache::new(config.workflow_cache_ttl))
  }

  pub fn runtime(&self) -> &Arc<Runtime> {
    &self.runtime
  }

  pub fn cache(&self) -> &TtlCache<String, Arc<Workflow>> {
    &self.cache
  }

  /// Execute a workflow run.
  ///
  /// Never fails: a workflow that cannot be loaded or validated is recorded
  /// as an `error` run before any node executes.
  #[instrument(
    name = "execute_workflow",
    skip(self, parameters, cancel),
    fields(workflow_id = %workflow_id, execution_id = %execution_id)
  )]
  pub async fn execute_workflow(
    &self,
    workflow_id: &str,
    execution_id: &str,
    parameters: Bag,
    cancel: CancellationToken,
  ) -> RunOutcome {
    match self.load(workflow_id).await {
      Ok(workflow) => {
        self
          .runtime
          .invoke(&workflow, execution_id, parameters, cancel)
          .await
      }
      Err(e) => {
        error!(workflow_id = %workflow_id, error = %e, "failed to load workflow");
        self
          .runtime
          .fail_run(workflow_id, execution_id, &e.to_string())
          .await
      }
    }
  }

  /// Load and validate a workflow, reusing a cached copy while it is fresh.
  pub async fn load(&self, workflow_id: &str) -> Result<Arc<Workflow>, RuntimeError> {
    let key = workflow_id.to_string();
    if let Some(workflow) = self.cache.get(&key) {
      debug!(workflow_id = %workflow_id, "workflow cache hit");
      return Ok(workflow);
    }

    let record = self.store.load_workflow(workflow_id).await?;
    let def = WorkflowDef::from_parts(
      record.workflow_id,
      record.name,
      &record.nodes.0,
      &record.edges.0,
    )?;
    let workflow = Arc::new(Workflow::from_def(def)?);

    self.cache.insert(key, workflow.clone());
    Ok(workflow)
  }

  /// Drop the cached copy of a workflow, e.g. after it was edited.
  pub fn invalidate(&self, workflow_id: &str) {
    self.cache.invalidate(&workflow_id.to_string());
  }
}
