use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use edgeflow_config::WorkflowDef;
use edgeflow_host_http::{HttpPolicy, ReqwestHttpClient};
use edgeflow_runtime::{Bag, HttpFailureMode, Runtime, RuntimeConfig, WorkflowEngine};
use edgeflow_store::{RunStore, SqliteStore, WorkflowRecord};
use edgeflow_workflow::Workflow;

/// Edgeflow - a dependency-driven workflow engine
#[derive(Parser)]
#[command(name = "edgeflow")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.edgeflow)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Endpoint of the data-query service used by data_request nodes
  #[arg(
    long,
    global = true,
    env = "EDGEFLOW_DATA_QUERY_URL",
    default_value = "http://localhost:8787/api/data"
  )]
  data_query_url: String,

  /// What http_request nodes do on transport failure (fatal or recoverable)
  #[arg(long, global = true, default_value_t = HttpFailureMode::Fatal)]
  http_failure: HttpFailureMode,

  /// Timeout for outgoing HTTP requests, in milliseconds
  #[arg(long, global = true, default_value_t = 30_000)]
  http_timeout_ms: u64,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a workflow or task
  Run {
    #[command(subcommand)]
    target: RunTarget,
  },

  /// Inspect persisted executions
  Execution {
    #[command(subcommand)]
    command: ExecutionCommand,
  },
}

#[derive(Subcommand)]
enum RunTarget {
  /// Run an entire workflow
  Workflow {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,
  },

  /// Run a single node from a workflow
  Task {
    /// Path to the workflow file (JSON)
    workflow_file: PathBuf,

    /// The node ID to execute
    #[arg(long)]
    node: String,
  },
}

#[derive(Subcommand)]
enum ExecutionCommand {
  /// Show a single execution
  Show { execution_id: String },

  /// List executions of a workflow
  List { workflow_id: String },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(io::stderr)
    .init();

  let data_dir = match cli.data_dir.clone() {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".edgeflow"),
  };

  let Some(command) = cli.command.as_ref() else {
    println!("edgeflow - use --help to see available commands");
    return Ok(());
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async {
    let store = open_store(&data_dir).await?;

    match command {
      Commands::Run { target } => match target {
        RunTarget::Workflow { workflow_file } => run_workflow(&cli, store, workflow_file).await,
        RunTarget::Task {
          workflow_file,
          node,
        } => run_task(&cli, store, workflow_file, node).await,
      },
      Commands::Execution { command } => match command {
        ExecutionCommand::Show { execution_id } => show_execution(store, execution_id).await,
        ExecutionCommand::List { workflow_id } => list_executions(store, workflow_id).await,
      },
    }
  })
}

async fn open_store(data_dir: &Path) -> Result<Arc<SqliteStore>> {
  tokio::fs::create_dir_all(data_dir)
    .await
    .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

  let path = data_dir.join("edgeflow.db");
  let store = SqliteStore::open(&path)
    .await
    .with_context(|| format!("failed to open database: {}", path.display()))?;

  Ok(Arc::new(store))
}

fn runtime_config(cli: &Cli) -> RuntimeConfig {
  // Each CLI invocation runs once, so definitions are never reused.
  RuntimeConfig {
    data_query_url: cli.data_query_url.clone(),
    http_failure_mode: cli.http_failure,
    workflow_cache_ttl: Duration::ZERO,
  }
}

fn build_runtime(cli: &Cli, config: &RuntimeConfig, store: Arc<dyn RunStore>) -> Result<Runtime> {
  let http = ReqwestHttpClient::new(HttpPolicy {
    timeout: Some(Duration::from_millis(cli.http_timeout_ms)),
    allowed_hosts: None,
  })
  .context("failed to create http client")?;

  Ok(Runtime::new(config, Arc::new(http), store))
}

async fn read_workflow(workflow_file: &Path) -> Result<WorkflowDef> {
  let workflow_content = tokio::fs::read_to_string(workflow_file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", workflow_file.display()))?;

  let mut workflow_def = WorkflowDef::from_json(&workflow_content)
    .with_context(|| format!("failed to parse workflow file: {}", workflow_file.display()))?;

  if workflow_def.workflow_id.is_empty() {
    workflow_def.workflow_id = workflow_file
      .file_stem()
      .map(|stem| stem.to_string_lossy().into_owned())
      .unwrap_or_else(|| "workflow".to_string());
  }

  Ok(workflow_def)
}

async fn run_workflow(cli: &Cli, store: Arc<SqliteStore>, workflow_file: &Path) -> Result<()> {
  let workflow_def = read_workflow(workflow_file).await?;
  eprintln!("Loaded workflow: {} ({})", workflow_def.name, workflow_def.workflow_id);

  // Store the definition so the run goes through the normal load path
  let record = WorkflowRecord::new(
    workflow_def.workflow_id.clone(),
    workflow_def.name.clone(),
    serde_json::to_value(&workflow_def.nodes)?,
    serde_json::to_value(&workflow_def.edges)?,
  );
  store
    .save_workflow(&record)
    .await
    .context("failed to save workflow")?;

  let parameters = read_payload_from_stdin()?;
  eprintln!("Parameters: {}", serde_json::Value::Object(parameters.clone()));

  let config = runtime_config(cli);
  let runtime = build_runtime(cli, &config, store)?;
  let engine = WorkflowEngine::from_config(Arc::new(runtime), &config);

  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      on_interrupt.cancel();
    }
  });

  let execution_id = uuid::Uuid::new_v4().to_string();
  let outcome = engine
    .execute_workflow(&workflow_def.workflow_id, &execution_id, parameters, cancel)
    .await;

  eprintln!("Execution {}: {:?}", outcome.execution_id, outcome.status);
  println!("{}", serde_json::to_string_pretty(&outcome)?);

  if let Some(error) = &outcome.error {
    bail!("workflow execution failed: {}", error);
  }

  Ok(())
}

async fn run_task(
  cli: &Cli,
  store: Arc<SqliteStore>,
  workflow_file: &Path,
  node_id: &str,
) -> Result<()> {
  let workflow_def = read_workflow(workflow_file).await?;
  let workflow = Workflow::from_def(workflow_def).context("invalid workflow")?;

  let node = workflow
    .get_node(node_id)
    .with_context(|| format!("node '{}' not found in workflow", node_id))?;
  eprintln!("Running node: {} (type: {})", node_id, node.node_type);

  let inputs = read_payload_from_stdin()?;
  eprintln!("Inputs: {}", serde_json::Value::Object(inputs.clone()));

  let runtime = build_runtime(cli, &runtime_config(cli), store)?;
  let outputs = runtime
    .invoke_node(&workflow, node_id, inputs)
    .await
    .context("node execution failed")?;

  eprintln!("Node execution completed");
  println!("{}", serde_json::to_string_pretty(&outputs)?);

  Ok(())
}

async fn show_execution(store: Arc<SqliteStore>, execution_id: &str) -> Result<()> {
  let record = store
    .get_execution(execution_id)
    .await
    .with_context(|| format!("failed to load execution '{}'", execution_id))?;

  println!("{}", serde_json::to_string_pretty(&record)?);
  Ok(())
}

async fn list_executions(store: Arc<SqliteStore>, workflow_id: &str) -> Result<()> {
  let records = store
    .list_executions(workflow_id)
    .await
    .with_context(|| format!("failed to list executions of '{}'", workflow_id))?;

  for record in records {
    println!(
      "{}\t{:?}\t{}",
      record.execution_id,
      record.status,
      record.updated_at.to_rfc3339()
    );
  }
  Ok(())
}

fn read_payload_from_stdin() -> Result<Bag> {
  use std::io::IsTerminal;

  if io::stdin().is_terminal() {
    // No stdin pipe, use empty object
    return Ok(Bag::new());
  }

  let mut input = String::new();
  io::stdin()
    .read_to_string(&mut input)
    .context("failed to read payload from stdin")?;

  if input.trim().is_empty() {
    return Ok(Bag::new());
  }

  let payload: serde_json::Value =
    serde_json::from_str(&input).context("failed to parse payload JSON from stdin")?;

  match payload {
    serde_json::Value::Object(map) => Ok(map),
    other => bail!("payload must be a JSON object, got: {}", other),
  }
}
