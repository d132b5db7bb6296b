//! Thin async client for the Fluree HTTP API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Failure talking to the Fluree server.
#[derive(Debug, Error)]
pub enum DownstreamError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type DownstreamResult = Result<Value, DownstreamError>;

/// Shared HTTP client for all Fluree tools.
#[derive(Debug, Clone)]
pub struct FlureeClient {
    http: Client,
}

impl FlureeClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let http = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
            warn!("Falling back to default HTTP client: {}", e);
            Client::new()
        });
        Self { http }
    }

    /// POST a JSON body (or no body) and decode the JSON response.
    pub async fn post(&self, url: &str, body: Option<&Value>) -> DownstreamResult {
        let mut request = self.http.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(url, request).await
    }

    /// GET and decode the JSON response.
    pub async fn get(&self, url: &str) -> DownstreamResult {
        self.send(url, self.http.get(url)).await
    }

    async fn send(&self, url: &str, request: RequestBuilder) -> DownstreamResult {
        debug!("Calling Fluree: {}", url);
        let response = request.send().await.map_err(|source| DownstreamError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DownstreamError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        response.json::<Value>().await.map_err(|source| DownstreamError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

impl Default for FlureeClient {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}
