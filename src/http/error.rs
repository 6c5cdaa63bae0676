//! Gateway error taxonomy.
//!
//! Every failure path ends in a well-formed plain-text response; none of
//! these are retried.

use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Origin is not allowed.")]
    OriginNotAllowed(Option<String>),

    #[error("Origin is explicitly blocked.")]
    OriginBlocked(String),

    #[error("Please provide a valid 'url' query parameter.")]
    MissingUrl,

    #[error("Invalid URL format.")]
    InvalidUrl(String),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Method {0} is not supported.")]
    MethodNotAllowed(Method),

    #[error("Request body exceeds {0} bytes.")]
    PayloadTooLarge(usize),

    #[error("Failed to connect to the target server.\n{detail}")]
    Upstream { url: String, detail: String },
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::OriginNotAllowed(_) | Self::OriginBlocked(_) => StatusCode::FORBIDDEN,
            Self::MissingUrl
            | Self::InvalidUrl(_)
            | Self::UnsupportedScheme(_)
            | Self::InvalidHost(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::OriginNotAllowed(_) => "origin_not_allowed",
            Self::OriginBlocked(_) => "origin_blocked",
            Self::MissingUrl => "missing_url",
            Self::InvalidUrl(_) => "invalid_url",
            Self::UnsupportedScheme(_) => "unsupported_scheme",
            Self::InvalidHost(_) => "invalid_host",
            Self::MethodNotAllowed(_) => "method_not_allowed",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Upstream { .. } => "upstream_unreachable",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        if matches!(self, Self::MethodNotAllowed(_)) {
            headers.insert(
                header::ALLOW,
                HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
            );
        }
        response
    }
}
