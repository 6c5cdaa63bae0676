//! Origin whitelist / blacklist evaluation.

use std::collections::HashSet;

use axum::http::{header::ORIGIN, HeaderMap};

use crate::config::PolicyConfig;
use crate::http::error::GatewayError;

/// Decides which calling origins may use the gateway.
///
/// Built once from [`PolicyConfig`] and shared read-only between requests.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    whitelist: HashSet<String>,
    blacklist: HashSet<String>,
}

impl OriginPolicy {
    pub fn new(config: &PolicyConfig) -> Self {
        Self {
            whitelist: config.origin_whitelist.iter().cloned().collect(),
            blacklist: config.origin_blacklist.iter().cloned().collect(),
        }
    }

    /// True if the whitelist is empty or contains `origin`.
    /// A missing origin is refused whenever a whitelist is configured.
    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        if self.whitelist.is_empty() {
            return true;
        }
        origin.is_some_and(|o| self.whitelist.contains(o))
    }

    /// True if `origin` is blacklisted. A missing origin is never blocked.
    pub fn is_blocked(&self, origin: Option<&str>) -> bool {
        if self.blacklist.is_empty() {
            return false;
        }
        origin.is_some_and(|o| self.blacklist.contains(o))
    }

    /// Evaluate every `Origin` value on a request.
    ///
    /// The whitelist passes if any value is allowed; the blacklist trips if
    /// any value is blocked. Both checks always run.
    pub fn check(&self, headers: &HeaderMap) -> Result<(), GatewayError> {
        let origins: Vec<&str> = headers
            .get_all(ORIGIN)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();

        let allowed = if origins.is_empty() {
            self.is_allowed(None)
        } else {
            origins.iter().any(|o| self.is_allowed(Some(*o)))
        };
        if !allowed {
            return Err(GatewayError::OriginNotAllowed(first_origin(&origins)));
        }

        if let Some(blocked) = origins.iter().find(|o| self.is_blocked(Some(**o))) {
            return Err(GatewayError::OriginBlocked(blocked.to_string()));
        }

        Ok(())
    }
}

fn first_origin(origins: &[&str]) -> Option<String> {
    origins.first().map(|o| o.to_string())
}
