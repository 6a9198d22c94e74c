//! Shared fixtures for runtime integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use edgeflow_config::WorkflowDef;
use edgeflow_host_http::{HttpClient, HttpError, HttpRequest, HttpResponse};
use edgeflow_runtime::{
  Bag, ChannelNotifier, ExecutionEvent, HttpFailureMode, Runtime, RuntimeConfig,
};
use edgeflow_store::MemoryStore;
use edgeflow_workflow::Workflow;
use serde_json::Value;
use tokio::sync::mpsc;

pub const DATA_QUERY_URL: &str = "http://data.test/api/data";

/// HTTP client answering from canned routes. Unrouted requests get a 404.
#[derive(Default)]
pub struct MockHttpClient {
  routes: Mutex<Vec<(String, u16, String)>>,
  requests: Mutex<Vec<HttpRequest>>,
}

impl MockHttpClient {
  pub fn new() -> Self {
    Self::default()
  }

  /// Answer requests whose URL starts with `prefix`.
  pub fn route(self, prefix: &str, status: u16, body: Value) -> Self {
    self
      .routes
      .lock()
      .unwrap()
      .push((prefix.to_string(), status, body.to_string()));
    self
  }

  pub fn requests(&self) -> Vec<HttpRequest> {
    self.requests.lock().unwrap().clone()
  }
}

#[async_trait]
impl HttpClient for MockHttpClient {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
    let route = self
      .routes
      .lock()
      .unwrap()
      .iter()
      .find(|(prefix, _, _)| request.url.starts_with(prefix.as_str()))
      .map(|(_, status, body)| (*status, body.clone()));
    self.requests.lock().unwrap().push(request);

    let (status, body) = route.unwrap_or((404, r#"{"error":"not found"}"#.to_string()));
    Ok(HttpResponse {
      status,
      headers: Vec::new(),
      body,
    })
  }
}

pub fn bag(value: Value) -> Bag {
  value.as_object().cloned().expect("expected a JSON object")
}

pub fn workflow(nodes: Value, edges: Value) -> Workflow {
  let def = WorkflowDef::from_parts("wf-test", "Test Workflow", &nodes, &edges)
    .expect("failed to parse workflow");
  Workflow::from_def(def).expect("invalid workflow")
}

pub fn config() -> RuntimeConfig {
  RuntimeConfig {
    data_query_url: DATA_QUERY_URL.to_string(),
    http_failure_mode: HttpFailureMode::Fatal,
    ..Default::default()
  }
}

/// A runtime over a memory store, plus a receiver for its events.
pub struct Harness {
  pub runtime: Runtime,
  pub store: Arc<MemoryStore>,
  pub events: mpsc::UnboundedReceiver<ExecutionEvent>,
}

impl Harness {
  pub fn new(http: Arc<dyn HttpClient>) -> Self {
    Self::with_config(&config(), http)
  }

  pub fn with_config(config: &RuntimeConfig, http: Arc<dyn HttpClient>) -> Self {
    let store = Arc::new(MemoryStore::with_history());
    let (sender, events) = mpsc::unbounded_channel();
    let runtime = Runtime::new(config, http, store.clone())
      .with_notifier(Arc::new(ChannelNotifier::new(sender)));

    Self {
      runtime,
      store,
      events,
    }
  }

  /// Drain events emitted so far.
  pub fn drain_events(&mut self) -> Vec<ExecutionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = self.events.try_recv() {
      events.push(event);
    }
    events
  }
}
