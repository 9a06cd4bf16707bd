// ABOUTME: HTTP probe against a candidate environment's health endpoint.
// ABOUTME: Returns the raw status and body; the verifier decides what counts as healthy.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Error, Result};

/// Raw response from a health endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: String,
}

impl ProbeResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport-level probe failures.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(String),
}

/// Issues one GET against a health URL.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> std::result::Result<ProbeResponse, ProbeError>;
}

/// Production probe backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cutover/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::HttpClient(e.to_string()))?;
        Ok(Self { client })
    }

    /// Reuse an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout(timeout)
    } else {
        ProbeError::Request(e.to_string())
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn get(&self, url: &str, timeout: Duration) -> std::result::Result<ProbeResponse, ProbeError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;
        Ok(ProbeResponse { status, body })
    }
}
