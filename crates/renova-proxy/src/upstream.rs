//! Upstream origin access
//!
//! [`ImageUpstream`] is the seam between the proxy and the network. The
//! production implementation wraps `reqwest`; tests substitute a mock or a
//! scripted fake.

use crate::error::{ConfigError, UpstreamError};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;

/// Raw reply from an upstream origin
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// HTTP status as returned
    pub status: StatusCode,
    /// `content-type` header, if present and valid UTF-8
    pub content_type: Option<String>,
    /// Full body
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Create response with status and body
    #[inline]
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    /// With content type
    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Whether the status is 2xx
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Fetches resources from an upstream origin
///
/// Implementations return `Ok` for any HTTP reply, including 4xx/5xx, and
/// `Err` only when no reply was obtained.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageUpstream: Send + Sync {
    /// Issue a GET for `url`
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError>;
}

/// `reqwest`-backed upstream
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Create client with a per-request timeout
    ///
    /// # Errors
    /// Returns [`ConfigError::Client`] if the TLS backend cannot initialize
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("renova-proxy/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Client(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageUpstream for HttpUpstream {
    async fn get(&self, url: &Url) -> Result<UpstreamResponse, UpstreamError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| UpstreamError::transport(url.clone(), e.to_string()))?;

        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::transport(url.clone(), e.to_string()))?;

        Ok(UpstreamResponse {
            status,
            content_type,
            body,
        })
    }
}
