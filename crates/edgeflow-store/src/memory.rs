use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{ExecutionRecord, ExecutionUpdate, RunStore, StoreError, WorkflowRecord};

/// In-memory store.
///
/// Holds the latest record of each execution. A store built with
/// [`MemoryStore::with_history`] also keeps every update it receives, for
/// inspecting the snapshots written during a run. That history is never
/// pruned.
#[derive(Default)]
pub struct MemoryStore {
  workflows: RwLock<HashMap<String, WorkflowRecord>>,
  executions: RwLock<HashMap<String, ExecutionRecord>>,
  history: Option<RwLock<Vec<(String, ExecutionUpdate)>>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// A store that records every update in [`MemoryStore::history`].
  pub fn with_history() -> Self {
    Self {
      history: Some(RwLock::new(Vec::new())),
      ..Self::default()
    }
  }

  /// All updates written for an execution, oldest first. Empty unless the
  /// store was built with [`MemoryStore::with_history`].
  pub async fn history(&self, execution_id: &str) -> Vec<ExecutionUpdate> {
    let Some(history) = &self.history else {
      return Vec::new();
    };
    history
      .read()
      .await
      .iter()
      .filter(|(id, _)| id == execution_id)
      .map(|(_, update)| update.clone())
      .collect()
  }
}

#[async_trait]
impl RunStore for MemoryStore {
  async fn load_workflow(&self, workflow_id: &str) -> Result<WorkflowRecord, StoreError> {
    self
      .workflows
      .read()
      .await
      .get(workflow_id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(format!("workflow '{}'", workflow_id)))
  }

  async fn save_workflow(&self, workflow: &WorkflowRecord) -> Result<(), StoreError> {
    self
      .workflows
      .write()
      .await
      .insert(workflow.workflow_id.clone(), workflow.clone());
    Ok(())
  }

  async fn update_execution(
    &self,
    execution_id: &str,
    update: &ExecutionUpdate,
  ) -> Result<(), StoreError> {
    let record = ExecutionRecord::from_update(execution_id, update, Utc::now());
    self
      .executions
      .write()
      .await
      .insert(execution_id.to_string(), record);
    if let Some(history) = &self.history {
      history
        .write()
        .await
        .push((execution_id.to_string(), update.clone()));
    }
    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError> {
    self
      .executions
      .read()
      .await
      .get(execution_id)
      .cloned()
      .ok_or_else(|| StoreError::NotFound(format!("execution '{}'", execution_id)))
  }

  async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
    let mut records: Vec<ExecutionRecord> = self
      .executions
      .read()
      .await
      .values()
      .filter(|record| record.workflow_id == workflow_id)
      .cloned()
      .collect();
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    Ok(records)
  }
}
