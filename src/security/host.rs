//! Destination host validation.
//!
//! A host is accepted when it is an IPv4 literal, an IPv6 literal, or a
//! syntactically valid domain whose last label is a recognized top-level
//! domain. The TLD check is intentionally loose: a short list of generic TLDs
//! plus any two-letter country-code-shaped label. It is not a registry lookup.

use std::net::{Ipv4Addr, Ipv6Addr};

/// Generic TLDs accepted in addition to two-letter country codes.
const GENERIC_TLDS: &[&str] = &["com", "net", "org", "edu", "gov", "mil"];

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Returns true if `host` may be used as a forwarding target.
pub fn is_valid_host(host: &str) -> bool {
    if host.is_empty() {
        return false;
    }
    is_ipv4(host) || is_ipv6(host) || has_recognized_tld(host)
}

pub fn is_ipv4(host: &str) -> bool {
    host.parse::<Ipv4Addr>().is_ok()
}

/// Accepts both bare (`::1`) and bracketed (`[::1]`) forms.
pub fn is_ipv6(host: &str) -> bool {
    let bare = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    bare.parse::<Ipv6Addr>().is_ok()
}

/// Domain syntax check followed by the TLD check on the final label.
pub fn has_recognized_tld(host: &str) -> bool {
    let host = host.strip_suffix('.').unwrap_or(host);
    if host.is_empty() || host.len() > MAX_DOMAIN_LEN {
        return false;
    }

    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() < 2 || !labels.iter().all(|l| is_valid_label(l)) {
        return false;
    }

    labels.last().is_some_and(|tld| is_recognized_tld(tld))
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

fn is_recognized_tld(tld: &str) -> bool {
    let tld = tld.to_ascii_lowercase();
    GENERIC_TLDS.contains(&tld.as_str())
        || (tld.len() == 2 && tld.bytes().all(|b| b.is_ascii_alphabetic()))
}
