//! Handlers that forward their input bag: triggers, log sinks and unknown types.

use serde_json::json;
use tracing::{info, warn};

use super::{NodeConfig, into_bag};
use crate::input::Bag;

pub(super) fn trigger(config: &NodeConfig<'_>) -> Bag {
  config.inputs().clone()
}

pub(super) fn log(config: &NodeConfig<'_>) -> Bag {
  let data = config.inputs();

  info!(
    target: "edgeflow::node_log",
    node_id = %config.node().id,
    data = %serde_json::Value::Object(data.clone()),
    "node log"
  );

  into_bag(json!({ "logged": true, "data": data }))
}

pub(super) fn custom(config: &NodeConfig<'_>, node_type: &str) -> Bag {
  warn!(
    node_id = %config.node().id,
    node_type = %node_type,
    "unknown node type, passing inputs through"
  );
  config.inputs().clone()
}
