use std::fmt;
use std::time::Duration;

use reqwest::header;

use crate::TransportError;

/// Blocking `POST(uri, json_body) -> json_body` exchange with the adapter.
///
/// Implementations must be shareable across statements; each call is one
/// complete round trip. The body returned is the raw response text,
/// regardless of HTTP status.
pub trait Transport: Send + Sync {
    fn post(&self, url: &str, body: String) -> Result<String, TransportError>;
}

/// Default transport backed by `reqwest::blocking`.
#[derive(Clone)]
pub struct HttpTransport {
    http: reqwest::blocking::Client,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Builds a transport whose requests time out after `timeout_ms`.
    pub fn new(timeout_ms: u64) -> Result<Self, TransportError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self { http })
    }
}

impl Transport for HttpTransport {
    fn post(&self, url: &str, body: String) -> Result<String, TransportError> {
        let response = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()?;

        #[cfg(feature = "tracing")]
        tracing::trace!(status = response.status().as_u16(), "adapter responded");

        Ok(response.text()?)
    }
}
