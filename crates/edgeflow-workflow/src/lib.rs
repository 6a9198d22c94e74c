//! Edgeflow Workflow
//!
//! This crate provides the validated workflow representation for edgeflow.
//! A [`Workflow`] is built from a [`edgeflow_config::WorkflowDef`] and is
//! ready for execution:
//! - Node ids are unique
//! - Edges referencing unknown nodes are dropped
//! - The graph is acyclic
//! - Start nodes, terminal nodes and per-node dependencies are precomputed

mod error;
mod graph;
mod node;
mod workflow;

pub use error::WorkflowError;
pub use graph::{Edge, Graph};
pub use node::{Node, NodeKind};
pub use workflow::Workflow;
