use std::time::Duration;

use url::Url;

use crate::error::HttpError;

/// Restrictions applied to every outgoing request.
#[derive(Debug, Clone)]
pub struct HttpPolicy {
  /// Per-request timeout. `None` waits indefinitely.
  pub timeout: Option<Duration>,
  /// Hosts requests may target. `None` allows any host.
  pub allowed_hosts: Option<Vec<String>>,
}

impl Default for HttpPolicy {
  fn default() -> Self {
    Self {
      timeout: Some(Duration::from_secs(30)),
      allowed_hosts: None,
    }
  }
}

impl HttpPolicy {
  /// Parse a URL and check it against the policy.
  pub fn check(&self, raw: &str) -> Result<Url, HttpError> {
    let url = Url::parse(raw).map_err(|e| HttpError::InvalidUrl {
      url: raw.to_string(),
      message: e.to_string(),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
      return Err(HttpError::UnsupportedScheme(url.scheme().to_string()));
    }

    if let Some(allowed) = &self.allowed_hosts {
      let host = url.host_str().unwrap_or_default();
      if !allowed.iter().any(|h| h.eq_ignore_ascii_case(host)) {
        return Err(HttpError::HostNotAllowed(host.to_string()));
      }
    }

    Ok(url)
  }
}
