//! `condition` / `if`: evaluate a boolean expression over the input bag.
//!
//! Output is `{ result, branch: "true" | "false", data }`. An expression that
//! is missing or fails to evaluate is false.

use serde_json::{Value, json};
use tracing::warn;

use super::{NodeConfig, into_bag};
use crate::input::Bag;

pub(super) fn execute(config: &NodeConfig<'_>) -> Bag {
  let data = config.inputs();

  let expression = config
    .configured_raw("condition")
    .or_else(|| config.configured_raw("expression"))
    .and_then(Value::as_str);

  let result = match expression {
    Some(expression) => config
      .expressions()
      .eval_bool(expression, data)
      .unwrap_or_else(|e| {
        warn!(node_id = %config.node().id, error = %e, "condition expression failed");
        false
      }),
    None => false,
  };

  into_bag(json!({
    "result": result,
    "branch": if result { "true" } else { "false" },
    "data": data,
  }))
}
