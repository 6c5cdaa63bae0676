//! Outbound request construction.
//!
//! # Responsibilities
//! - Copy the client's method verbatim
//! - Forward only the safe subset of client headers
//! - Carry the buffered client body when the method takes one
//!
//! # Design Decisions
//! - The inbound request is never mutated; a new request is built per hop
//! - Redirect hops are always plain GETs without client headers

use axum::body::Bytes;
use axum::http::{HeaderMap, Method};
use url::Url;

use crate::routing::TargetDescriptor;
use crate::security::headers::forwardable_headers;

/// A request about to be sent to the upstream target.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl OutboundRequest {
    /// Build the first hop from the client's request.
    pub fn build(
        method: Method,
        inbound_headers: &HeaderMap,
        body: Bytes,
        target: TargetDescriptor,
    ) -> Self {
        let body = if method == Method::GET || body.is_empty() {
            None
        } else {
            Some(body)
        };

        Self {
            method,
            url: target.into_url(),
            headers: forwardable_headers(inbound_headers),
            body,
        }
    }

    /// Build a follow-up GET for a redirect location.
    pub fn redirect(target: TargetDescriptor) -> Self {
        Self {
            method: Method::GET,
            url: target.into_url(),
            headers: HeaderMap::new(),
            body: None,
        }
    }
}
