//! # Configuration
//!
//! Controller and server settings loaded from environment variables.
//!
//! All settings have defaults in [`crate::constants`]. Values that fail to
//! parse are logged and replaced by their default.

mod controller;
mod duration;
mod server;

pub use controller::ControllerConfig;
pub use duration::parse_kubernetes_duration;
pub use server::ServerConfig;

use std::fmt::Display;
use std::str::FromStr;
use tracing::warn;

/// Load configuration from environment variables with defaults
pub fn load_config() -> (ControllerConfig, ServerConfig) {
    (ControllerConfig::from_env(), ServerConfig::from_env())
}

/// Parse `key` from `lookup`, or return `default` when unset or invalid
pub(crate) fn var_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr + Display,
    <T as FromStr>::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(e) => {
                warn!("Invalid value '{}' for {}: {}, using default {}", raw, key, e, default);
                default
            }
        },
    }
}

/// Non-empty value of `key`
pub(crate) fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
