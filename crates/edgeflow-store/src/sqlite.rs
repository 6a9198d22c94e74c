use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::types::Json;

use crate::{ExecutionRecord, ExecutionUpdate, RunStore, StoreError, WorkflowRecord};

/// SQLite-based store implementation.
pub struct SqliteStore {
  pool: SqlitePool,
}

impl SqliteStore {
  /// Create a new SQLite store with the given connection pool.
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  /// Open (creating if needed) a database file and run migrations.
  pub async fn open(path: &Path) -> Result<Self, StoreError> {
    let options = SqliteConnectOptions::new()
      .filename(path)
      .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Open a private in-memory database and run migrations.
  pub async fn open_in_memory() -> Result<Self, StoreError> {
    // Every connection to :memory: is a separate database.
    let pool = SqlitePoolOptions::new()
      .max_connections(1)
      .connect("sqlite::memory:")
      .await?;
    let store = Self::new(pool);
    store.migrate().await?;
    Ok(store)
  }

  /// Run database migrations.
  pub async fn migrate(&self) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    Ok(())
  }
}

#[async_trait]
impl RunStore for SqliteStore {
  async fn load_workflow(&self, workflow_id: &str) -> Result<WorkflowRecord, StoreError> {
    sqlx::query_as(
      r#"
            SELECT workflow_id, name, nodes, edges
            FROM workflows
            WHERE workflow_id = ?
            "#,
    )
    .bind(workflow_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("workflow '{}'", workflow_id)))
  }

  async fn save_workflow(&self, workflow: &WorkflowRecord) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflows (workflow_id, name, nodes, edges)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(workflow_id) DO UPDATE SET
              name = excluded.name,
              nodes = excluded.nodes,
              edges = excluded.edges
            "#,
    )
    .bind(&workflow.workflow_id)
    .bind(&workflow.name)
    .bind(&workflow.nodes)
    .bind(&workflow.edges)
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn update_execution(
    &self,
    execution_id: &str,
    update: &ExecutionUpdate,
  ) -> Result<(), StoreError> {
    sqlx::query(
      r#"
            INSERT INTO workflow_executions
              (execution_id, workflow_id, status, node_executions, result, error, ended_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(execution_id) DO UPDATE SET
              status = excluded.status,
              node_executions = excluded.node_executions,
              result = excluded.result,
              error = excluded.error,
              ended_at = excluded.ended_at,
              updated_at = excluded.updated_at
            "#,
    )
    .bind(execution_id)
    .bind(&update.workflow_id)
    .bind(update.status)
    .bind(Json(&update.node_executions))
    .bind(update.result.as_ref().map(Json))
    .bind(&update.error)
    .bind(update.ended_at)
    .bind(Utc::now())
    .execute(&self.pool)
    .await?;

    Ok(())
  }

  async fn get_execution(&self, execution_id: &str) -> Result<ExecutionRecord, StoreError> {
    sqlx::query_as(
      r#"
            SELECT execution_id, workflow_id, status, node_executions, result, error, ended_at, updated_at
            FROM workflow_executions
            WHERE execution_id = ?
            "#,
    )
    .bind(execution_id)
    .fetch_optional(&self.pool)
    .await?
    .ok_or_else(|| StoreError::NotFound(format!("execution '{}'", execution_id)))
  }

  async fn list_executions(&self, workflow_id: &str) -> Result<Vec<ExecutionRecord>, StoreError> {
    Ok(
      sqlx::query_as(
        r#"
            SELECT execution_id, workflow_id, status, node_executions, result, error, ended_at, updated_at
            FROM workflow_executions
            WHERE workflow_id = ?
            ORDER BY updated_at DESC
            "#,
      )
      .bind(workflow_id)
      .fetch_all(&self.pool)
      .await?,
    )
  }
}
