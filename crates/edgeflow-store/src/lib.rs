//! Edgeflow Store
//!
//! This crate provides the run store trait and implementations. The store is
//! the system of record for workflow definitions and the durable copy of run
//! state; the runtime writes to it at run start, on every node status
//! transition and at run end.
//!
//! The [`RunStore`] trait defines operations for:
//! - Loading workflow definitions
//! - Upserting execution state keyed by execution id
//! - Reading execution records back for polling

mod memory;
mod sqlite;
mod types;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use types::{
  ExecutionRecord, ExecutionStatus, ExecutionUpdate, NodeExecution, NodeStatus, WorkflowRecord,
};

use async_trait::async_trait;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  /// The requested record was not found.
  #[error("not found: {0}")]
  NotFound(String),

  /// A database error occurred.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Running migrations failed.
  #[error("migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),
}

/// Storage trait for workflow definitions and executions.
#[async_trait]
pub trait RunStore: Send + Sync {
  /// Load a workflow definition by ID.
  async fn load_workflow(&self, workflow_id: &str) -> Result<WorkflowRecord, StoreError>;

  /// Create or replace a workflow definition.
  async fn save_workflow(&self, workflow: &WorkflowRecord) -> Result<(), StoreError>;

  /// Upsert the state of an execution.
  async fn update_execution(
    &self,
    execution_id: &str,
    update: &ExecutionUpdate,
  ) -> Result<(), StoreError>;

  /// Get an execution by ID.
  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError>;

  /// List executions for a workflow, most recently updated first.
  async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError>;
}
