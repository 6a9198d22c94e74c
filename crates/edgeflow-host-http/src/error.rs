/// Errors raised while sending an HTTP request.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
  #[error("invalid url '{url}': {message}")]
  InvalidUrl { url: String, message: String },

  #[error("unsupported url scheme: {0}")]
  UnsupportedScheme(String),

  #[error("host not allowed by policy: {0}")]
  HostNotAllowed(String),

  #[error("unsupported HTTP method: {0}")]
  InvalidMethod(String),

  #[error("invalid header '{name}': {message}")]
  InvalidHeader { name: String, message: String },

  #[error("{0}")]
  Request(#[from] reqwest::Error),
}
