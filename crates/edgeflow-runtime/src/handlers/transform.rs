//! `transform` / `json_transform`: evaluate an expression over the input bag.

use serde_json::{Value, json};
use tracing::warn;

use super::{NodeConfig, into_bag};
use crate::input::Bag;

pub(super) fn execute(config: &NodeConfig<'_>) -> Bag {
  let data = config.inputs();

  let Some(expression) = config.configured_raw("expression").and_then(Value::as_str) else {
    return into_bag(json!({ "result": data }));
  };

  match config.expressions().eval(expression, data) {
    Ok(result) => into_bag(json!({ "result": result })),
    Err(e) => {
      warn!(node_id = %config.node().id, error = %e, "transform expression failed");
      into_bag(json!({ "result": data, "error": "Transform expression failed" }))
    }
  }
}
