//! `http_request`: issue an HTTP call and return `{ status, ok, data }`.
//!
//! Transport failures are fatal to the run unless the runtime is configured
//! with [`HttpFailureMode::Recoverable`], in which case they are returned as
//! `{ status: 0, ok: false, data: null, error }`.

use edgeflow_host_http::{HttpClient, HttpRequest};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{NodeConfig, into_bag};
use crate::config::HttpFailureMode;
use crate::error::RuntimeError;
use crate::input::Bag;

pub(super) async fn execute(
  config: &NodeConfig<'_>,
  client: &dyn HttpClient,
  failure_mode: HttpFailureMode,
) -> Result<Bag, RuntimeError> {
  let request = build_request(config)?;

  debug!(
    node_id = %config.node().id,
    method = %request.method,
    url = %request.url,
    "http request"
  );

  match client.send(request).await {
    Ok(response) => Ok(into_bag(json!({
      "status": response.status,
      "ok": response.is_success(),
      "data": response.json_or_text(),
    }))),
    Err(e) => match failure_mode {
      HttpFailureMode::Fatal => Err(e.into()),
      HttpFailureMode::Recoverable => {
        warn!(node_id = %config.node().id, error = %e, "http request failed");
        Ok(into_bag(json!({
          "status": 0,
          "ok": false,
          "data": null,
          "error": e.to_string(),
        })))
      }
    },
  }
}

fn build_request(config: &NodeConfig<'_>) -> Result<HttpRequest, RuntimeError> {
  let url = config
    .get_string("url")?
    .ok_or_else(|| RuntimeError::MissingConfig {
      node_id: config.node().id.clone(),
      field: "url".to_string(),
    })?;

  let method = config
    .get_string("method")?
    .map(|m| m.to_ascii_uppercase())
    .unwrap_or_else(|| "GET".to_string());

  let headers = config.get("headers")?.map(header_pairs).unwrap_or_default();

  let body = config.get("body")?.map(|body| match body {
    Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::String(s)),
    other => other,
  });

  Ok(HttpRequest {
    method,
    url,
    headers,
    body,
  })
}

/// Header pairs from an object, or from a JSON-encoded object.
fn header_pairs(value: Value) -> Vec<(String, String)> {
  let value = match value {
    Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
    other => other,
  };

  match value {
    Value::Object(map) => map
      .into_iter()
      .filter(|(_, v)| !v.is_null())
      .map(|(name, v)| {
        let v = match v {
          Value::String(s) => s,
          other => other.to_string(),
        };
        (name, v)
      })
      .collect(),
    _ => Vec::new(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::expression::Expressions;
  use async_trait::async_trait;
  use edgeflow_config::NodeDef;
  use edgeflow_host_http::{HttpError, HttpResponse};
  use edgeflow_workflow::Node;
  use std::sync::Mutex;

  #[derive(Default)]
  struct StubClient {
    refuse: bool,
    requests: Mutex<Vec<HttpRequest>>,
  }

  #[async_trait]
  impl HttpClient for StubClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
      self.requests.lock().unwrap().push(request);
      if self.refuse {
        return Err(HttpError::HostNotAllowed("api.example.com".to_string()));
      }
      Ok(HttpResponse {
        status: 201,
        headers: Vec::new(),
        body: r#"{"id":5}"#.to_string(),
      })
    }
  }

  fn node(data: Value) -> Node {
    Node::from(
      serde_json::from_value::<NodeDef>(json!({ "id": "call", "type": "http_request", "data": data }))
        .unwrap(),
    )
  }

  #[tokio::test]
  async fn test_request_and_output() {
    let client = StubClient::default();
    let node = node(json!({
      "url": "https://api.example.com/items",
      "method": "post",
      "headers": { "x-token": "abc" },
      "body": "{\"name\":\"widget\"}"
    }));
    let inputs = Bag::new();
    let expressions = Expressions::new();
    let config = NodeConfig::new(&node, &inputs, &expressions);

    let output = execute(&config, &client, HttpFailureMode::Fatal).await.unwrap();

    assert_eq!(
      Value::Object(output),
      json!({ "status": 201, "ok": true, "data": { "id": 5 } })
    );
    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].headers, vec![("x-token".to_string(), "abc".to_string())]);
    assert_eq!(requests[0].body, Some(json!({ "name": "widget" })));
  }

  #[tokio::test]
  async fn test_defaults_to_get_without_body() {
    let client = StubClient::default();
    let node = node(json!({ "url": "https://api.example.com/items" }));
    let inputs = Bag::new();
    let expressions = Expressions::new();
    let config = NodeConfig::new(&node, &inputs, &expressions);

    execute(&config, &client, HttpFailureMode::Fatal).await.unwrap();

    let requests = client.requests.lock().unwrap();
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].body, None);
  }

  #[tokio::test]
  async fn test_missing_url() {
    let client = StubClient::default();
    let node = node(json!({}));
    let inputs = Bag::new();
    let expressions = Expressions::new();
    let config = NodeConfig::new(&node, &inputs, &expressions);

    let result = execute(&config, &client, HttpFailureMode::Fatal).await;

    assert!(matches!(result, Err(RuntimeError::MissingConfig { ref field, .. }) if field == "url"));
  }

  #[tokio::test]
  async fn test_transport_failure_modes() {
    let client = StubClient {
      refuse: true,
      ..Default::default()
    };
    let node = node(json!({ "url": "https://api.example.com/items" }));
    let inputs = Bag::new();
    let expressions = Expressions::new();
    let config = NodeConfig::new(&node, &inputs, &expressions);

    let fatal = execute(&config, &client, HttpFailureMode::Fatal).await;
    assert!(matches!(fatal, Err(RuntimeError::Http(_))));

    let recovered = execute(&config, &client, HttpFailureMode::Recoverable)
      .await
      .unwrap();
    assert_eq!(recovered["status"], 0);
    assert_eq!(recovered["ok"], false);
    assert_eq!(recovered["data"], Value::Null);
    assert_eq!(
      recovered["error"],
      "host not allowed by policy: api.example.com"
    );
  }
}
