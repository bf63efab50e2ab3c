//! HTTP transport to the daemon API
//!
//! A single request/response round trip, with no retry. Retry policy lives
//! one layer up in the client, so the transport can be swapped for a
//! scripted one in tests.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::common::{Error, Result, TransportError};

/// HTTP method used for a daemon call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// One round trip to the daemon, decoded as JSON
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request to `path` (relative to the API base URL)
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, TransportError>;

    /// Base URL requests are resolved against
    fn base_url(&self) -> &str;
}

/// reqwest-backed transport
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `http://localhost:9999/api`)
    /// with a per-request deadline
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            // the daemon is local; environment proxies must not intercept it
            .no_proxy()
            .user_agent(concat!("decoy-remote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout {
                url: url.to_string(),
                after: self.timeout,
            }
        } else if e.is_body() || e.is_decode() {
            TransportError::MalformedResponse {
                url: url.to_string(),
                message: e.to_string(),
            }
        } else {
            TransportError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        };
        if let Some(body) = body {
            builder = builder.json(body);
        }

        tracing::trace!(?method, url = %url, "Daemon request");

        let response = builder.send().await.map_err(|e| self.classify(&url, e))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| self.classify(&url, e))?;

        // The daemon reports failures as JSON with 4xx/5xx, so a JSON body
        // is decoded whatever the status code
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => {
                tracing::trace!(url = %url, status = status.as_u16(), "Daemon response");
                Ok(value)
            }
            Err(_) if !status.is_success() => Err(TransportError::Status {
                url,
                status: status.as_u16(),
            }),
            Err(e) => Err(TransportError::MalformedResponse {
                url,
                message: e.to_string(),
            }),
        }
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
