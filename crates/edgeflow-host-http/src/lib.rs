//! Edgeflow HTTP host capability
//!
//! Provides the [`HttpClient`] seam used by nodes that talk to the network
//! (`http_request` and the data-query service), and a reqwest-backed
//! implementation that enforces an [`HttpPolicy`] before sending.

mod client;
mod error;
mod policy;
mod reqwest_client;

pub use client::{HttpClient, HttpRequest, HttpResponse};
pub use error::HttpError;
pub use policy::HttpPolicy;
pub use reqwest_client::ReqwestHttpClient;
