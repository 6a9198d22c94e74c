//! Input resolution.
//!
//! Builds the input bag a node runs with:
//! 1. For every incoming edge, the source node's output field `sourceOutput`
//!    is placed at `targetInput`. A missing upstream field is simply absent.
//! 2. Start nodes additionally receive the run's trigger parameters. Values
//!    placed by edges are never overwritten by parameters.
//!
//! An edge without `sourceOutput` forwards the source's whole output bag; an
//! edge without `targetInput` lands under the source node's id.

use std::collections::HashMap;

use edgeflow_workflow::Graph;
use serde_json::{Map, Value};

/// A mapping of named values: node inputs, node outputs, trigger parameters.
pub type Bag = Map<String, Value>;

/// Resolve the input bag of `node_id` from completed upstream outputs.
pub fn resolve_inputs(
  graph: &Graph,
  node_id: &str,
  outputs: &HashMap<String, Bag>,
  parameters: &Bag,
) -> Bag {
  let mut inputs = Bag::new();

  for edge in graph.incoming(node_id) {
    let Some(upstream) = outputs.get(&edge.source) else {
      continue;
    };

    let value = match &edge.source_output {
      Some(field) => upstream.get(field).cloned(),
      None => Some(Value::Object(upstream.clone())),
    };

    if let Some(value) = value {
      let slot = edge
        .target_input
        .clone()
        .unwrap_or_else(|| edge.source.clone());
      inputs.insert(slot, value);
    }
  }

  if graph.is_start(node_id) {
    for (key, value) in parameters {
      inputs.entry(key.clone()).or_insert_with(|| value.clone());
    }
  }

  inputs
}
