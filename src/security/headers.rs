//! Header filtering in both directions.
//!
//! # Responsibilities
//! - Drop request headers that must not reach the upstream target
//! - Strip response headers that must never reach the browser
//!
//! # Design Decisions
//! - Names compare case-insensitively (`HeaderName` is lowercase already)
//! - Header values are forwarded verbatim, no syntax checks
//! - Cookies set by third-party targets are never relayed to the client

use axum::http::HeaderMap;

/// Request headers never forwarded upstream.
pub const IGNORED_REQUEST_HEADERS: &[&str] = &[
    "host",
    "connection",
    "accept-encoding",
    "cache-control",
    "postman-token",
];

/// Response headers always removed before the client sees them.
pub const STRIPPED_RESPONSE_HEADERS: &[&str] = &["set-cookie", "set-cookie2", "transfer-encoding"];

/// Request framing headers. The outbound client frames the body it actually sends.
const REFRAMED_REQUEST_HEADERS: &[&str] = &["content-length", "transfer-encoding"];

/// Framing headers the gateway re-derives from the buffered body.
const REFRAMED_RESPONSE_HEADERS: &[&str] = &["connection", "content-length"];

pub fn is_forwardable(name: &str) -> bool {
    !IGNORED_REQUEST_HEADERS
        .iter()
        .chain(REFRAMED_REQUEST_HEADERS)
        .any(|h| name.eq_ignore_ascii_case(h))
}

pub fn is_stripped(name: &str) -> bool {
    STRIPPED_RESPONSE_HEADERS
        .iter()
        .chain(REFRAMED_RESPONSE_HEADERS)
        .any(|h| name.eq_ignore_ascii_case(h))
}

/// Copy the forwardable subset of `inbound`.
///
/// Each name is carried once with all of its values, in first-seen order.
pub fn forwardable_headers(inbound: &HeaderMap) -> HeaderMap {
    let mut outbound = HeaderMap::with_capacity(inbound.keys_len());
    for name in inbound.keys() {
        if !is_forwardable(name.as_str()) || outbound.contains_key(name) {
            continue;
        }
        for value in inbound.get_all(name) {
            outbound.append(name.clone(), value.clone());
        }
    }
    outbound
}

/// Remove every header in the strip-set from `headers`.
pub fn strip_response_headers(headers: &mut HeaderMap) {
    for name in STRIPPED_RESPONSE_HEADERS.iter().chain(REFRAMED_RESPONSE_HEADERS) {
        headers.remove(*name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_ignored_request_headers() {
        assert!(!is_forwardable("Host"));
        assert!(!is_forwardable("CONNECTION"));
        assert!(!is_forwardable("Accept-Encoding"));
        assert!(!is_forwardable("cache-control"));
        assert!(!is_forwardable("Postman-Token"));
        assert!(is_forwardable("Authorization"));
        assert!(is_forwardable("Origin"));
    }

    #[test]
    fn test_request_framing_is_not_forwarded() {
        let mut inbound = HeaderMap::new();
        inbound.insert("content-length", HeaderValue::from_static("7"));
        inbound.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        inbound.insert("content-type", HeaderValue::from_static("text/plain"));

        let outbound = forwardable_headers(&inbound);
        assert!(!outbound.contains_key("content-length"));
        assert!(!outbound.contains_key("transfer-encoding"));
        assert_eq!(outbound.get("content-type").unwrap(), "text/plain");
    }

    #[test]
    fn test_forwardable_headers_keeps_all_values() {
        let mut inbound = HeaderMap::new();
        inbound.insert("host", HeaderValue::from_static("gateway.local"));
        inbound.insert("cache-control", HeaderValue::from_static("no-cache"));
        inbound.append("x-custom", HeaderValue::from_static("one"));
        inbound.append("x-custom", HeaderValue::from_static("two"));
        inbound.insert("accept", HeaderValue::from_static("application/json"));

        let outbound = forwardable_headers(&inbound);
        assert!(!outbound.contains_key("host"));
        assert!(!outbound.contains_key("cache-control"));
        assert_eq!(outbound.get("accept").unwrap(), "application/json");

        let custom: Vec<_> = outbound.get_all("x-custom").iter().collect();
        assert_eq!(custom, vec!["one", "two"]);
    }

    #[test]
    fn test_values_forwarded_verbatim() {
        let mut inbound = HeaderMap::new();
        inbound.insert("x-odd", HeaderValue::from_static("  spaced ;; value  "));
        let outbound = forwardable_headers(&inbound);
        assert_eq!(outbound.get("x-odd").unwrap(), "  spaced ;; value  ");
    }

    #[test]
    fn test_strip_response_headers() {
        let mut headers = HeaderMap::new();
        headers.append("set-cookie", HeaderValue::from_static("a=1"));
        headers.append("set-cookie", HeaderValue::from_static("b=2"));
        headers.insert("set-cookie2", HeaderValue::from_static("c=3"));
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("content-length", HeaderValue::from_static("10"));
        headers.insert("etag", HeaderValue::from_static("\"abc\""));

        strip_response_headers(&mut headers);
        assert!(!headers.contains_key("set-cookie"));
        assert!(!headers.contains_key("set-cookie2"));
        assert!(!headers.contains_key("transfer-encoding"));
        assert!(!headers.contains_key("content-length"));
        assert!(headers.contains_key("etag"));
        assert!(is_stripped("Set-Cookie"));
        assert!(!is_stripped("ETag"));
    }
}
