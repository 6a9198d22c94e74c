use async_trait::async_trait;

use crate::error::HttpError;

/// An outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
  pub method: String,
  pub url: String,
  pub headers: Vec<(String, String)>,
  /// Sent JSON-encoded when present.
  pub body: Option<serde_json::Value>,
}

impl HttpRequest {
  pub fn get(url: impl Into<String>) -> Self {
    Self {
      method: "GET".to_string(),
      url: url.into(),
      headers: Vec::new(),
      body: None,
    }
  }
}

/// A received response with the body read as text.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
  pub status: u16,
  pub headers: Vec<(String, String)>,
  pub body: String,
}

impl HttpResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }

  /// Parse the body as JSON, falling back to a JSON string.
  pub fn json_or_text(&self) -> serde_json::Value {
    serde_json::from_str(&self.body).unwrap_or_else(|_| serde_json::Value::String(self.body.clone()))
  }
}

/// Sends HTTP requests on behalf of nodes.
///
/// Transport failures are returned as [`HttpError`]; any response, whatever
/// its status, is `Ok`.
#[async_trait]
pub trait HttpClient: Send + Sync {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError>;
}
