use async_trait::async_trait;
use reqwest::{Client, Method};
use tracing::debug;

use crate::client::{HttpClient, HttpRequest, HttpResponse};
use crate::error::HttpError;
use crate::policy::HttpPolicy;

/// [`HttpClient`] backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
  client: Client,
  policy: HttpPolicy,
}

impl ReqwestHttpClient {
  pub fn new(policy: HttpPolicy) -> Result<Self, HttpError> {
    let mut builder = Client::builder();
    if let Some(timeout) = policy.timeout {
      builder = builder.timeout(timeout);
    }

    Ok(Self {
      client: builder.build()?,
      policy,
    })
  }

  pub fn policy(&self) -> &HttpPolicy {
    &self.policy
  }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
  async fn send(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
    let url = self.policy.check(&request.url)?;
    let method = parse_method(&request.method)?;

    debug!(method = %method, url = %url, "sending http request");

    let mut builder = self.client.request(method, url);

    for (name, value) in &request.headers {
      builder = builder.header(name.as_str(), value.as_str());
    }

    if let Some(body) = &request.body {
      builder = builder.json(body);
    }

    let response = builder.send().await?;

    let status = response.status().as_u16();
    let headers = response
      .headers()
      .iter()
      .filter_map(|(k, v)| {
        v.to_str()
          .ok()
          .map(|val| (k.as_str().to_string(), val.to_string()))
      })
      .collect();

    let body = response.text().await?;

    Ok(HttpResponse {
      status,
      headers,
      body,
    })
  }
}

fn parse_method(method: &str) -> Result<Method, HttpError> {
  match method.to_uppercase().as_str() {
    "GET" => Ok(Method::GET),
    "POST" => Ok(Method::POST),
    "PUT" => Ok(Method::PUT),
    "DELETE" => Ok(Method::DELETE),
    "PATCH" => Ok(Method::PATCH),
    "HEAD" => Ok(Method::HEAD),
    "OPTIONS" => Ok(Method::OPTIONS),
    _ => Err(HttpError::InvalidMethod(method.to_string())),
  }
}
