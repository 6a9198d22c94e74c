use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What an `http_request` node does when the request fails in transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HttpFailureMode {
  /// The node fails and the run is aborted.
  #[default]
  Fatal,
  /// The failure is encoded in the node output and the run continues.
  Recoverable,
}

impl FromStr for HttpFailureMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "fatal" => Ok(Self::Fatal),
      "recoverable" => Ok(Self::Recoverable),
      other => Err(format!(
        "unknown http failure mode '{}', expected 'fatal' or 'recoverable'",
        other
      )),
    }
  }
}

impl fmt::Display for HttpFailureMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Fatal => f.write_str("fatal"),
      Self::Recoverable => f.write_str("recoverable"),
    }
  }
}

/// Configuration for the runtime.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
  /// Endpoint of the data-query service used by `data_request` nodes.
  pub data_query_url: String,
  pub http_failure_mode: HttpFailureMode,
  /// How long loaded workflow definitions are reused. Zero disables caching.
  pub workflow_cache_ttl: Duration,
}

impl Default for RuntimeConfig {
  fn default() -> Self {
    Self {
      data_query_url: "http://localhost:8787/api/data".to_string(),
      http_failure_mode: HttpFailureMode::Fatal,
      workflow_cache_ttl: Duration::from_secs(30),
    }
  }
}
