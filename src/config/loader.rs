//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::{parse_origin_list, ProxyConfig};
use crate::config::validation::{validate_config, ValidationError};

/// Environment keys understood by [`apply_env_overrides`].
pub const ENV_BLACKLIST: &str = "CORS_BLACKLIST";
pub const ENV_WHITELIST: &str = "CORS_WHITELIST";
pub const ENV_MAX_REDIRECTS: &str = "MAX_REDIRECTS";
pub const ENV_MAX_AGE: &str = "CORS_MAX_AGE";
pub const ENV_ACCEPT_INVALID_CERTS: &str = "CORS_ACCEPT_INVALID_CERTS";
pub const ENV_NORMALIZE_URLS: &str = "CORS_NORMALIZE_URLS";
pub const ENV_BIND_ADDRESS: &str = "CORS_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value '{value}' for {key}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, then apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay values from a key-value source onto `config`.
///
/// Origin lists are comma-separated. A key that is present but empty clears
/// the corresponding list.
pub fn apply_env_overrides<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(ENV_BLACKLIST) {
        config.policy.origin_blacklist = parse_origin_list(&raw);
    }
    if let Some(raw) = lookup(ENV_WHITELIST) {
        config.policy.origin_whitelist = parse_origin_list(&raw);
    }
    if let Some(raw) = lookup(ENV_MAX_REDIRECTS) {
        config.policy.max_redirects = parse_value(ENV_MAX_REDIRECTS, &raw)?;
    }
    if let Some(raw) = lookup(ENV_MAX_AGE) {
        config.policy.cors_max_age = parse_value(ENV_MAX_AGE, &raw)?;
    }
    if let Some(raw) = lookup(ENV_ACCEPT_INVALID_CERTS) {
        config.upstream.accept_invalid_certs = parse_flag(ENV_ACCEPT_INVALID_CERTS, &raw)?;
    }
    if let Some(raw) = lookup(ENV_NORMALIZE_URLS) {
        config.policy.normalize_urls = parse_flag(ENV_NORMALIZE_URLS, &raw)?;
    }
    if let Some(raw) = lookup(ENV_BIND_ADDRESS) {
        config.listener.bind_address = raw.trim().to_string();
    }
    Ok(())
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Env {
        key,
        value: raw.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Env {
            key,
            value: raw.to_string(),
        }),
    }
}
