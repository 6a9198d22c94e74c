//! Data-query service client used by `data_request` nodes.

use std::sync::Arc;

use async_trait::async_trait;
use edgeflow_host_http::{HttpClient, HttpError, HttpRequest};
use url::Url;

use crate::error::RuntimeError;

/// A read query against a named table.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQuery {
  pub table: String,
  /// Comma-joined column list, `*` for all columns.
  pub select: String,
  pub limit: Option<u64>,
  /// Equality filters as `(column, value)`.
  pub filters: Vec<(String, String)>,
}

impl DataQuery {
  pub fn new(table: impl Into<String>) -> Self {
    Self {
      table: table.into(),
      select: "*".to_string(),
      limit: None,
      filters: Vec::new(),
    }
  }
}

/// Raw response of the data-query service.
#[derive(Debug, Clone, PartialEq)]
pub struct DataQueryResponse {
  pub status: u16,
  /// Parsed JSON body, or the body text as a JSON string.
  pub body: serde_json::Value,
}

impl DataQueryResponse {
  pub fn is_success(&self) -> bool {
    (200..300).contains(&self.status)
  }
}

/// Executes read queries for `data_request` nodes.
///
/// Non-2xx responses are `Ok`; only transport failures are errors.
#[async_trait]
pub trait DataQueryService: Send + Sync {
  async fn query(&self, query: &DataQuery) -> Result<DataQueryResponse, RuntimeError>;
}

/// Data-query service reached over HTTP.
///
/// Queries are sent as `GET <endpoint>?table=..&select=..&limit=..&filter_<col>=..`.
pub struct HttpDataQueryService {
  client: Arc<dyn HttpClient>,
  endpoint: String,
}

impl HttpDataQueryService {
  pub fn new(client: Arc<dyn HttpClient>, endpoint: impl Into<String>) -> Self {
    Self {
      client,
      endpoint: endpoint.into(),
    }
  }

  /// Build the request URL for a query.
  pub fn query_url(&self, query: &DataQuery) -> Result<Url, HttpError> {
    let mut url = Url::parse(&self.endpoint).map_err(|e| HttpError::InvalidUrl {
      url: self.endpoint.clone(),
      message: e.to_string(),
    })?;

    {
      let mut pairs = url.query_pairs_mut();
      pairs.append_pair("table", &query.table);
      pairs.append_pair("select", &query.select);
      if let Some(limit) = query.limit {
        pairs.append_pair("limit", &limit.to_string());
      }
      for (column, value) in &query.filters {
        pairs.append_pair(&format!("filter_{}", column), value);
      }
    }

    Ok(url)
  }
}

#[async_trait]
impl DataQueryService for HttpDataQueryService {
  async fn query(&self, query: &DataQuery) -> Result<DataQueryResponse, RuntimeError> {
    let url = self.query_url(query)?;
    let response = self.client.send(HttpRequest::get(url.as_str())).await?;

    Ok(DataQueryResponse {
      status: response.status,
      body: response.json_or_text(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use edgeflow_host_http::HttpResponse;
  use std::sync::Mutex;

  #[derive(Default)]
  struct RecordingClient {
    urls: Mutex<Vec<String>>,
  }

  #[async_trait]
  impl HttpClient for RecordingClient {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
      self.urls.lock().unwrap().push(request.url);
      Ok(HttpResponse {
        status: 200,
        headers: Vec::new(),
        body: r#"{"data":[{"id":1}],"total":1}"#.to_string(),
      })
    }
  }

  #[test]
  fn test_query_url() {
    let service = HttpDataQueryService::new(
      Arc::new(RecordingClient::default()),
      "http://localhost:8787/api/data",
    );
    let query = DataQuery {
      table: "users".to_string(),
      select: "id,name".to_string(),
      limit: Some(10),
      filters: vec![("status".to_string(), "active".to_string())],
    };

    let url = service.query_url(&query).unwrap();

    assert_eq!(
      url.as_str(),
      "http://localhost:8787/api/data?table=users&select=id%2Cname&limit=10&filter_status=active"
    );
  }

  #[test]
  fn test_invalid_endpoint() {
    let service = HttpDataQueryService::new(Arc::new(RecordingClient::default()), "not a url");
    let result = service.query_url(&DataQuery::new("users"));
    assert!(matches!(result, Err(HttpError::InvalidUrl { .. })));
  }

  #[tokio::test]
  async fn test_query_parses_body() {
    let client = Arc::new(RecordingClient::default());
    let service = HttpDataQueryService::new(client.clone(), "http://localhost:8787/api/data");

    let response = service.query(&DataQuery::new("users")).await.unwrap();

    assert!(response.is_success());
    assert_eq!(response.body["total"], 1);
    assert_eq!(
      client.urls.lock().unwrap().as_slice(),
      ["http://localhost:8787/api/data?table=users&select=*"]
    );
  }
}
