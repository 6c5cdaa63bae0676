//! CORS response headers.
//!
//! Origin restriction happens earlier in the origin middleware; this module
//! only tells the browser what it may read. `Allow-Origin` is therefore
//! always `*`.
//!
//! [`CorsHeaders::apply`] must run last, once every other client-facing
//! header has been collected, so that the exposed-headers list is complete.

use axum::http::{
    header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_EXPOSE_HEADERS, ACCESS_CONTROL_MAX_AGE, ACCESS_CONTROL_REQUEST_HEADERS,
        ACCESS_CONTROL_REQUEST_METHOD,
    },
    HeaderMap, HeaderValue, Method,
};

/// Composes CORS headers for gateway responses.
#[derive(Debug, Clone, Copy)]
pub struct CorsHeaders {
    max_age: u64,
}

impl CorsHeaders {
    /// `max_age` of zero leaves `Access-Control-Max-Age` unset.
    pub fn new(max_age: u64) -> Self {
        Self { max_age }
    }

    /// Add CORS headers to a fully collected outgoing header set.
    pub fn apply(&self, method: &Method, inbound: &HeaderMap, outgoing: &mut HeaderMap) {
        let exposed = exposed_header_names(outgoing);

        outgoing.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));

        if method == Method::OPTIONS {
            if let Some(requested) = inbound.get(ACCESS_CONTROL_REQUEST_METHOD) {
                outgoing.insert(ACCESS_CONTROL_ALLOW_METHODS, requested.clone());
            }
            if let Some(requested) = inbound.get(ACCESS_CONTROL_REQUEST_HEADERS) {
                outgoing.insert(ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            }
            if self.max_age > 0 {
                outgoing.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age));
            }
        }

        if let Some(exposed) = exposed {
            outgoing.insert(ACCESS_CONTROL_EXPOSE_HEADERS, exposed);
        }
    }
}

/// Comma-joined names of every non-CORS header, or `None` if there are none.
fn exposed_header_names(headers: &HeaderMap) -> Option<HeaderValue> {
    let names: Vec<&str> = headers
        .keys()
        .map(|name| name.as_str())
        .filter(|name| !name.starts_with("access-control-"))
        .collect();

    if names.is_empty() {
        return None;
    }
    HeaderValue::from_str(&names.join(",")).ok()
}
