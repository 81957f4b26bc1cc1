//! Raw HTTP transport for the axis client, built on `reqwest`.
//!
//! Sends exactly one request per call and returns the response for every
//! status code. The client keeps a cookie jar so that the server-side
//! rotation credential (an HTTP-only cookie) travels with the refresh call
//! without this crate ever reading it.

use async_trait::async_trait;
use axis_types::{ApiResponse, AxisError, OutboundRequest, Transport, traits::Result};
use reqwest::Client;
use std::time::Instant;

const USER_AGENT: &str = concat!("axis/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] implementation wrapping a `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Creates a transport with a cookie store enabled.
    ///
    /// # Errors
    ///
    /// Returns [`AxisError::Transport`] if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| AxisError::Transport(e.to_string()))?;
        Ok(Self { http })
    }

    /// Wraps an existing client (its cookie policy is left untouched).
    #[must_use]
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    fn map_error(error: &reqwest::Error, timeout_ms: u64) -> AxisError {
        if error.is_timeout() {
            AxisError::Timeout { timeout_ms }
        } else {
            AxisError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: OutboundRequest) -> Result<ApiResponse> {
        let timeout_ms = u64::try_from(request.timeout.as_millis()).unwrap_or(u64::MAX);
        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers)
            .timeout(request.timeout);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let start = Instant::now();
        let resp = builder
            .send()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| Self::map_error(&e, timeout_ms))?;

        tracing::debug!(
            method = %request.method,
            url = %request.url,
            status = status.as_u16(),
            elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "http exchange"
        );
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}
