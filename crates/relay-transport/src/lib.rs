//! # Relay Transport
//!
//! The production [`HttpTransport`] for Relay, built on `reqwest`.
//!
//! The transport is the terminal step of every chain: it receives the fully
//! prepared `HttpRequestBuilder` after the error-translation stage and
//! returns the raw `HttpResponse`, whatever its status. Failing to reach
//! the service or to read the response is a
//! [`ClientError::Connection`](relay_core::ClientError::Connection).

#![doc(html_root_url = "https://docs.rs/relay-transport/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use async_trait::async_trait;
use relay_core::{ClientError, ClientResult, HttpRequestBuilder, HttpResponse, InvocationContext};
use relay_middleware::HttpTransport;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Connection settings for [`ReqwestTransport`].
///
/// No timeout is applied unless one is configured; callers that need a
/// deadline can also cancel the invocation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransportOptions {
    /// Whole-request timeout in milliseconds.
    pub request_timeout_ms: Option<u64>,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: Option<u64>,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            request_timeout_ms: None,
            connect_timeout_ms: None,
            pool_max_idle_per_host: 100,
        }
    }
}

/// Sends requests with a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Creates a transport with default options.
    pub fn new() -> ClientResult<Self> {
        Self::with_options(&TransportOptions::default())
    }

    /// Creates a transport from `options`.
    pub fn with_options(options: &TransportOptions) -> ClientResult<Self> {
        let mut builder = Client::builder().pool_max_idle_per_host(options.pool_max_idle_per_host);
        if let Some(ms) = options.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = options.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(ms));
        }

        let client = builder
            .build()
            .map_err(|e| ClientError::connection_with_source("failed to create HTTP client", e))?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    #[must_use]
    pub const fn from_client(client: Client) -> Self {
        Self { client }
    }

    async fn send(&self, request: HttpRequestBuilder) -> ClientResult<HttpResponse> {
        let url = request.url();
        let response = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone())
            .body(request.body().clone())
            .send()
            .await
            .map_err(|e| ClientError::connection_with_source(format!("request to {url} failed"), e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::connection_with_source("failed to read response body", e))?;

        Ok(HttpResponse::new(status, body).with_headers(headers))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(
        &self,
        request: HttpRequestBuilder,
        ctx: &InvocationContext,
    ) -> ClientResult<HttpResponse> {
        let method = request.method().clone();
        let host = request.host_header();
        let path = request.path().to_string();
        let started = Instant::now();

        let result = tokio::select! {
            biased;
            () = ctx.cancelled() => Err(ClientError::Cancelled),
            result = self.send(request) => result,
        };

        let latency_ms = started.elapsed().as_millis();
        match &result {
            Ok(response) => debug!(
                request_id = %ctx.request_id(),
                http.method = %method,
                http.host = %host,
                http.path = %path,
                http.status_code = response.status().as_u16(),
                latency_ms,
                "Response received"
            ),
            Err(error) => debug!(
                request_id = %ctx.request_id(),
                http.method = %method,
                http.host = %host,
                http.path = %path,
                error = %error,
                latency_ms,
                "Request failed"
            ),
        }
        result
    }
}
