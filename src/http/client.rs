//! Upstream HTTP client.
//!
//! # Responsibilities
//! - Send one outbound request and buffer the whole response
//! - Enforce connect and per-call timeouts
//! - Map transport failures to a single gateway error
//!
//! # Design Decisions
//! - Automatic redirects are off; the response handler follows them itself
//! - No retries: one attempt per hop
//! - Certificate checks are only skipped when explicitly configured

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::error::GatewayError;
use crate::http::request::OutboundRequest;

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// URL this response was fetched from.
    pub url: Url,
}

impl OutboundResponse {
    /// Raw values: non-ASCII bytes are relayed, never reinterpreted.
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.headers.get(header::CONTENT_TYPE)
    }

    pub fn location(&self) -> Option<&HeaderValue> {
        self.headers.get(header::LOCATION)
    }

    pub fn is_redirect(&self) -> bool {
        self.status.is_redirection()
    }
}

/// Shared outbound client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs));

        if config.accept_invalid_certs {
            tracing::warn!("Upstream TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }

        Ok(Self {
            inner: builder.build()?,
        })
    }

    /// Send a request and read the full response body.
    pub async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, GatewayError> {
        let url = request.url.clone();

        let mut builder = self
            .inner
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| upstream_error(&url, e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| upstream_error(&url, e))?;

        tracing::debug!(
            target_url = %url,
            status = %status,
            body_len = body.len(),
            "Upstream responded"
        );

        Ok(OutboundResponse {
            status,
            headers,
            body,
            url,
        })
    }
}

fn upstream_error(url: &Url, err: reqwest::Error) -> GatewayError {
    let kind = if err.is_timeout() {
        "timeout"
    } else if err.is_connect() {
        "connect"
    } else {
        "transport"
    };
    tracing::error!(target_url = %url, kind, error = %err, "Upstream request failed");

    GatewayError::Upstream {
        url: url.to_string(),
        detail: error_chain(&err),
    }
}

/// Flatten an error and its sources into one line for diagnostics.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut detail = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        detail.push_str(": ");
        detail.push_str(&cause.to_string());
        source = cause.source();
    }
    detail
}
