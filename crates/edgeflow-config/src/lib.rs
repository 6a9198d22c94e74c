//! Edgeflow Config
//!
//! This crate contains the serializable workflow definition types for edgeflow.
//! These types mirror the persisted form of a workflow (a node list and an edge
//! list authored in the visual builder) before it is validated into a runnable
//! graph by `edgeflow-workflow`.
//!
//! Definitions can be loaded from:
//! - Workflow files (via the CLI)
//! - The run store, where `nodes` and `edges` are stored as JSON blobs

mod edge;
mod error;
mod node;
mod workflow;

pub use edge::EdgeDef;
pub use error::ConfigError;
pub use node::{NodeDef, NodeInput};
pub use workflow::WorkflowDef;
