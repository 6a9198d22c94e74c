//! Tests for ReqwestHttpClient against local sockets.

use std::time::Duration;

use edgeflow_host_http::{HttpClient, HttpError, HttpPolicy, HttpRequest, ReqwestHttpClient};

/// Bind an ephemeral port, then release it so nothing is listening there.
async fn closed_port() -> u16 {
  let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
    .await
    .expect("failed to bind");
  let port = listener.local_addr().unwrap().port();
  drop(listener);
  port
}

#[tokio::test]
async fn test_connection_refused_is_error() {
  let port = closed_port().await;
  let client = ReqwestHttpClient::new(HttpPolicy {
    timeout: Some(Duration::from_secs(5)),
    allowed_hosts: None,
  })
  .unwrap();

  let result = client
    .send(HttpRequest::get(format!("http://127.0.0.1:{}/", port)))
    .await;

  match result {
    Err(HttpError::Request(e)) => assert!(e.is_connect() || e.is_request()),
    other => panic!("expected request error, got {:?}", other),
  }
}

#[tokio::test]
async fn test_policy_checked_before_sending() {
  let client = ReqwestHttpClient::new(HttpPolicy {
    timeout: None,
    allowed_hosts: Some(vec!["localhost".to_string()]),
  })
  .unwrap();

  let result = client.send(HttpRequest::get("http://10.255.255.1/")).await;

  assert!(matches!(result, Err(HttpError::HostNotAllowed(_))));
}
