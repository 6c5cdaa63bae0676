//! Upstream response handling.
//!
//! # Responsibilities
//! - Follow upstream redirects up to the configured limit
//! - Annotate every encountered redirect with `X-CORS-Redirect`
//! - Strip unsafe headers and build the client-facing response
//!
//! # Design Decisions
//! - The redirect counter is local to one client request
//! - A redirect past the limit is returned to the client, never an error
//! - Headers are collected first and CORS applied last, so the exposed list
//!   sees the final header set

use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::Response,
};
use url::Url;

use crate::http::client::{OutboundResponse, UpstreamClient};
use crate::http::cors::CorsHeaders;
use crate::http::error::GatewayError;
use crate::http::request::OutboundRequest;
use crate::observability::metrics;
use crate::routing::TargetResolver;
use crate::security::headers::{is_stripped, strip_response_headers};

pub const X_CORS_REDIRECT: HeaderName = HeaderName::from_static("x-cors-redirect");
pub const X_REQUEST_URL: HeaderName = HeaderName::from_static("x-request-url");
pub const X_FINAL_URL: HeaderName = HeaderName::from_static("x-final-url");

const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// One 3xx response that carried a `Location`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    pub status: StatusCode,
    /// `Location` exactly as the upstream sent it.
    pub location: HeaderValue,
}

/// Result of following a redirect chain.
#[derive(Debug)]
pub struct ResolvedResponse {
    pub response: OutboundResponse,
    pub redirects: Vec<RedirectHop>,
    pub upstream_calls: u32,
}

/// Drives the redirect loop and shapes the final response.
#[derive(Debug, Clone)]
pub struct ResponseHandler {
    client: UpstreamClient,
    resolver: TargetResolver,
    cors: CorsHeaders,
    max_redirects: u32,
}

impl ResponseHandler {
    pub fn new(
        client: UpstreamClient,
        resolver: TargetResolver,
        cors: CorsHeaders,
        max_redirects: u32,
    ) -> Self {
        Self {
            client,
            resolver,
            cors,
            max_redirects,
        }
    }

    /// Follow redirects starting from the first upstream response.
    ///
    /// At most `max_redirects` further requests are made. A 3xx whose
    /// location cannot be resolved to a valid target is returned as-is.
    pub async fn follow_redirects(
        &self,
        first: OutboundResponse,
    ) -> Result<ResolvedResponse, GatewayError> {
        let mut current = first;
        let mut redirects = Vec::new();
        let mut redirect_count = 0u32;

        loop {
            let raw = match current.location() {
                Some(loc) if current.is_redirect() => loc.clone(),
                _ => break,
            };
            let location = String::from_utf8_lossy(raw.as_bytes()).into_owned();

            redirects.push(RedirectHop {
                status: current.status,
                location: raw,
            });

            if redirect_count >= self.max_redirects {
                tracing::info!(
                    status = %current.status,
                    location = %location,
                    max_redirects = self.max_redirects,
                    "Redirect limit reached, returning redirect to client"
                );
                metrics::record_redirect("limit_reached");
                break;
            }

            let next = match self.resolver.resolve_location(&current.url, &location) {
                Ok(next) => next,
                Err(e) => {
                    tracing::warn!(location = %location, error = %e, "Not following redirect");
                    metrics::record_redirect("rejected");
                    break;
                }
            };

            redirect_count += 1;
            metrics::record_redirect("followed");
            tracing::debug!(
                hop = redirect_count,
                status = %current.status,
                location = %next.url(),
                "Following redirect"
            );

            current = self.client.send(OutboundRequest::redirect(next)).await?;
        }

        Ok(ResolvedResponse {
            response: current,
            redirects,
            upstream_calls: redirect_count + 1,
        })
    }

    /// Build the client response from a resolved upstream response.
    pub fn finalize(
        &self,
        resolved: ResolvedResponse,
        method: &Method,
        inbound: &HeaderMap,
        requested: &Url,
    ) -> Response {
        let ResolvedResponse {
            response: upstream,
            redirects,
            ..
        } = resolved;

        let mut headers = collect_headers(&upstream.headers, &redirects, requested, &upstream.url);
        let content_type = upstream
            .content_type()
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        headers.insert(header::CONTENT_TYPE, content_type);
        self.cors.apply(method, inbound, &mut headers);

        let mut response = Response::new(Body::from(upstream.body));
        *response.status_mut() = upstream.status;
        *response.headers_mut() = headers;
        response
    }

    /// Build the response for a preflight request. No upstream contact.
    pub fn preflight(&self, inbound: &HeaderMap) -> Response {
        let mut headers = HeaderMap::new();
        self.cors.apply(&Method::OPTIONS, inbound, &mut headers);

        let mut response = Response::new(Body::empty());
        *response.status_mut() = StatusCode::OK;
        *response.headers_mut() = headers;
        response
    }
}

/// First phase: every header destined for the client, minus the strip-set.
fn collect_headers(
    upstream: &HeaderMap,
    redirects: &[RedirectHop],
    requested: &Url,
    final_url: &Url,
) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.keys_len() + 4);
    for (name, value) in upstream.iter() {
        if !is_stripped(name.as_str()) {
            headers.append(name.clone(), value.clone());
        }
    }

    for hop in redirects {
        let mut annotation = format!("{} ", hop.status.as_u16()).into_bytes();
        annotation.extend_from_slice(hop.location.as_bytes());
        if let Ok(value) = HeaderValue::from_bytes(&annotation) {
            headers.append(X_CORS_REDIRECT, value);
        }
    }

    if let Ok(value) = HeaderValue::from_str(requested.as_str()) {
        headers.insert(X_REQUEST_URL, value);
    }
    if let Ok(value) = HeaderValue::from_str(final_url.as_str()) {
        headers.insert(X_FINAL_URL, value);
    }

    strip_response_headers(&mut headers);
    headers
}
