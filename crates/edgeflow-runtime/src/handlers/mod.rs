//! Node dispatch.
//!
//! The [`Dispatcher`] maps a node's kind to its handler and runs it with the
//! node's resolved input bag. Handlers read their configuration through
//! [`NodeConfig`].
//!
//! Handlers either return an output bag or an error. An error is fatal to the
//! run; handlers with node-local failure paths encode the failure in their
//! output instead.

mod condition;
mod data_request;
mod http_request;
mod passthrough;
mod transform;

use std::sync::Arc;

use edgeflow_host_http::HttpClient;
use edgeflow_workflow::{Node, NodeKind};
use serde_json::Value;
use tracing::instrument;

use crate::config::HttpFailureMode;
use crate::error::RuntimeError;
use crate::expression::{Expressions, is_template};
use crate::input::Bag;
use crate::query::DataQueryService;

/// Configuration lookup for one node invocation.
///
/// A field is looked up in the node's structured `inputs` entries, then in
/// `node.data`, then in the resolved input bag. The first value that is not
/// null or an empty string wins.
pub struct NodeConfig<'a> {
  node: &'a Node,
  inputs: &'a Bag,
  expressions: &'a Expressions,
}

impl<'a> NodeConfig<'a> {
  pub fn new(node: &'a Node, inputs: &'a Bag, expressions: &'a Expressions) -> Self {
    Self {
      node,
      inputs,
      expressions,
    }
  }

  pub fn node(&self) -> &Node {
    self.node
  }

  /// The resolved input bag.
  pub fn inputs(&self) -> &Bag {
    self.inputs
  }

  pub fn expressions(&self) -> &Expressions {
    self.expressions
  }

  /// Look up a field in the node's own configuration only, without
  /// rendering templates. The input bag is never consulted.
  pub fn configured_raw(&self, field: &str) -> Option<&'a Value> {
    self.configured(field)
  }

  /// Look up a field, rendering templates in configured string values
  /// against the input bag.
  pub fn get(&self, field: &str) -> Result<Option<Value>, RuntimeError> {
    if let Some(value) = self.configured(field) {
      return self.render(field, value).map(Some);
    }

    Ok(self.inputs.get(field).filter(|v| is_set(v)).cloned())
  }

  /// Look up a field as a string. Non-string scalars are formatted as JSON.
  pub fn get_string(&self, field: &str) -> Result<Option<String>, RuntimeError> {
    let value = self.get(field)?;
    Ok(value.filter(is_set).map(|value| match value {
      Value::String(s) => s,
      other => other.to_string(),
    }))
  }

  fn configured(&self, field: &str) -> Option<&'a Value> {
    self
      .node
      .input(field)
      .filter(|v| is_set(v))
      .or_else(|| self.node.data.get(field).filter(|v| is_set(v)))
  }

  fn render(&self, field: &str, value: &Value) -> Result<Value, RuntimeError> {
    match value {
      Value::String(s) if is_template(s) => {
        self
          .expressions
          .render(s, self.inputs)
          .map_err(|e| RuntimeError::Template {
            node_id: self.node.id.clone(),
            field: field.to_string(),
            message: match e {
              RuntimeError::Expression { message } => message,
              other => other.to_string(),
            },
          })
      }
      Value::Array(items) => items
        .iter()
        .map(|item| self.render(field, item))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array),
      Value::Object(map) => map
        .iter()
        .map(|(k, v)| self.render(field, v).map(|v| (k.clone(), v)))
        .collect::<Result<Bag, _>>()
        .map(Value::Object),
      other => Ok(other.clone()),
    }
  }
}

fn is_set(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::String(s) => !s.is_empty(),
    _ => true,
  }
}

/// Turn a JSON object into an output bag.
fn into_bag(value: Value) -> Bag {
  match value {
    Value::Object(map) => map,
    _ => Bag::new(),
  }
}

/// Routes nodes to their handlers.
pub struct Dispatcher {
  http: Arc<dyn HttpClient>,
  data_query: Arc<dyn DataQueryService>,
  expressions: Expressions,
  http_failure_mode: HttpFailureMode,
}

impl Dispatcher {
  pub fn new(
    http: Arc<dyn HttpClient>,
    data_query: Arc<dyn DataQueryService>,
    http_failure_mode: HttpFailureMode,
  ) -> Self {
    Self {
      http,
      data_query,
      expressions: Expressions::new(),
      http_failure_mode,
    }
  }

  /// Replace the data-query service.
  pub fn with_data_query_service(mut self, data_query: Arc<dyn DataQueryService>) -> Self {
    self.data_query = data_query;
    self
  }

  pub fn http_failure_mode(&self) -> HttpFailureMode {
    self.http_failure_mode
  }

  /// Run a node's handler with its resolved inputs.
  #[instrument(
    name = "dispatch",
    skip(self, node, inputs),
    fields(node_id = %node.id, node_type = %node.node_type)
  )]
  pub async fn dispatch(&self, node: &Node, inputs: Bag) -> Result<Bag, RuntimeError> {
    let config = NodeConfig::new(node, &inputs, &self.expressions);

    match &node.kind {
      NodeKind::Trigger => Ok(passthrough::trigger(&config)),
      NodeKind::DataRequest => Ok(data_request::execute(&config, self.data_query.as_ref()).await),
      NodeKind::HttpRequest => {
        http_request::execute(&config, self.http.as_ref(), self.http_failure_mode).await
      }
      NodeKind::Transform => Ok(transform::execute(&config)),
      NodeKind::Condition => Ok(condition::execute(&config)),
      NodeKind::Log => Ok(passthrough::log(&config)),
      NodeKind::Custom(tag) => Ok(passthrough::custom(&config, tag)),
    }
  }
}
