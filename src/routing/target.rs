//! Target URL resolution.
//!
//! # Responsibilities
//! - Turn the raw `url` query parameter into an absolute target
//! - Enforce http/https and the destination host policy
//! - Optionally normalize scheme-less input (`example.com:443/path`)
//!
//! # Design Decisions
//! - Strict absolute-URL parsing is the default
//! - Normalization only infers a scheme from an explicit port; it never
//!   repairs half-written schemes such as `http:/example.com`

use url::{Host, Url};

use crate::http::error::GatewayError;
use crate::security::host::is_valid_host;

/// A validated forwarding target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDescriptor {
    url: Url,
}

impl TargetDescriptor {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn into_url(self) -> Url {
        self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    pub fn port(&self) -> Option<u16> {
        self.url.port()
    }

    /// Path plus query string, as sent on the request line.
    pub fn path_and_query(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }
}

/// Parses and validates target URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetResolver {
    normalize: bool,
}

impl TargetResolver {
    pub fn new(normalize: bool) -> Self {
        Self { normalize }
    }

    /// Resolve the raw `url` parameter. `None` and empty strings are both
    /// reported as a missing parameter.
    pub fn resolve(&self, raw: Option<&str>) -> Result<TargetDescriptor, GatewayError> {
        let raw = match raw.map(str::trim) {
            Some(r) if !r.is_empty() => r,
            _ => return Err(GatewayError::MissingUrl),
        };

        let url = if self.normalize && !raw.contains("://") {
            let normalized =
                normalize(raw).ok_or_else(|| GatewayError::InvalidUrl(raw.to_string()))?;
            parse_absolute(&normalized)?
        } else {
            parse_absolute(raw)?
        };

        validate(url)
    }

    /// Resolve a redirect `Location` against the URL that produced it.
    pub fn resolve_location(
        &self,
        base: &Url,
        location: &str,
    ) -> Result<TargetDescriptor, GatewayError> {
        let url = base
            .join(location.trim())
            .map_err(|_| GatewayError::InvalidUrl(location.to_string()))?;
        validate(url)
    }
}

fn parse_absolute(raw: &str) -> Result<Url, GatewayError> {
    Url::parse(raw).map_err(|_| GatewayError::InvalidUrl(raw.to_string()))
}

fn validate(url: Url) -> Result<TargetDescriptor, GatewayError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(GatewayError::UnsupportedScheme(url.scheme().to_string()));
    }

    let host = match url.host() {
        Some(Host::Domain(d)) => d.to_string(),
        Some(Host::Ipv4(ip)) => ip.to_string(),
        Some(Host::Ipv6(ip)) => ip.to_string(),
        None => return Err(GatewayError::InvalidHost(String::new())),
    };
    if !is_valid_host(&host) {
        return Err(GatewayError::InvalidHost(host));
    }

    Ok(TargetDescriptor { url })
}

/// Prefix a scheme onto scheme-less input.
///
/// `443` as the explicit port selects https; anything else gets http.
/// Returns `None` for input that already starts with a bare `http:`/`https:`
/// but is missing the `//`.
fn normalize(raw: &str) -> Option<String> {
    let lower = raw.to_ascii_lowercase();
    if lower.starts_with("http:") || lower.starts_with("https:") {
        return None;
    }

    let rest = raw.strip_prefix("//").unwrap_or(raw);
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    if authority.is_empty() {
        return None;
    }

    let port = authority
        .rsplit_once(':')
        .map(|(_, p)| p)
        .filter(|p| !p.is_empty() && p.len() <= 5 && p.bytes().all(|b| b.is_ascii_digit()));
    let scheme = if port == Some("443") { "https" } else { "http" };

    Some(format!("{scheme}://{rest}"))
}
