//! Edgeflow Runtime
//!
//! This crate executes workflows. A run walks the dependency graph one node at
//! a time, resolves each node's inputs from upstream outputs and the trigger
//! parameters, dispatches the node to its handler, and persists every state
//! transition to the run store.
//!
//! ```text
//! TriggerRunner ──▶ WorkflowEngine ──▶ Runtime ──▶ Dispatcher ──▶ handlers
//!  (channel)        (load + cache)     (schedule,    (by node      (http, data,
//!                                       persist)      kind)         transform, ...)
//! ```

mod cache;
mod config;
mod context;
mod engine;
mod error;
mod events;
mod expression;
mod handlers;
mod input;
mod query;
mod result;
mod runner;
mod runtime;

pub use cache::TtlCache;
pub use config::{HttpFailureMode, RuntimeConfig};
pub use context::ExecutionContext;
pub use engine::WorkflowEngine;
pub use error::RuntimeError;
pub use events::{ChannelNotifier, ExecutionEvent, ExecutionNotifier, NoopNotifier};
pub use expression::Expressions;
pub use handlers::{Dispatcher, NodeConfig};
pub use input::{Bag, resolve_inputs};
pub use query::{DataQuery, DataQueryResponse, DataQueryService, HttpDataQueryService};
pub use result::RunOutcome;
pub use runner::{TriggerHandle, TriggerRequest, TriggerRunner};
pub use runtime::Runtime;
