//! # Controller Configuration
//!
//! Reconciliation settings loaded from environment variables.

use super::{non_empty, parse_kubernetes_duration, var_or_default};
use crate::constants::{
    DEFAULT_ERROR_BACKOFF_MAX_SECS, DEFAULT_ERROR_BACKOFF_MIN_SECS,
    DEFAULT_PROVIDER_RECONCILE_INTERVAL_SECS, DEFAULT_STRATEGY_CONFIG_MAP_NAME,
};
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// ConfigMap holding the deployment type to strategy mapping
    pub strategy_config_map_name: String,
    /// Namespace of that ConfigMap; the instance namespace when unset
    pub strategy_config_map_namespace: Option<String>,
    /// Re-check interval reported by the built-in providers
    pub provider_reconcile_interval: Duration,
    /// Only watch this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    pub error_backoff_min_secs: u64,
    pub error_backoff_max_secs: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            strategy_config_map_name: DEFAULT_STRATEGY_CONFIG_MAP_NAME.to_string(),
            strategy_config_map_namespace: None,
            provider_reconcile_interval: Duration::from_secs(
                DEFAULT_PROVIDER_RECONCILE_INTERVAL_SECS,
            ),
            watch_namespace: None,
            error_backoff_min_secs: DEFAULT_ERROR_BACKOFF_MIN_SECS,
            error_backoff_max_secs: DEFAULT_ERROR_BACKOFF_MAX_SECS,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let provider_reconcile_interval = match non_empty(&lookup, "PROVIDER_RECONCILE_INTERVAL")
        {
            None => defaults.provider_reconcile_interval,
            Some(raw) => parse_kubernetes_duration(&raw).unwrap_or_else(|e| {
                warn!("Invalid PROVIDER_RECONCILE_INTERVAL: {}, using default", e);
                defaults.provider_reconcile_interval
            }),
        };

        let error_backoff_min_secs =
            var_or_default(&lookup, "ERROR_BACKOFF_MIN_SECS", defaults.error_backoff_min_secs)
                .max(1);
        let mut error_backoff_max_secs =
            var_or_default(&lookup, "ERROR_BACKOFF_MAX_SECS", defaults.error_backoff_max_secs);
        if error_backoff_max_secs < error_backoff_min_secs {
            warn!(
                "ERROR_BACKOFF_MAX_SECS ({}) is below ERROR_BACKOFF_MIN_SECS ({}), clamping",
                error_backoff_max_secs, error_backoff_min_secs
            );
            error_backoff_max_secs = error_backoff_min_secs;
        }

        Self {
            strategy_config_map_name: non_empty(&lookup, "STRATEGY_CONFIG_MAP_NAME")
                .unwrap_or(defaults.strategy_config_map_name),
            strategy_config_map_namespace: non_empty(&lookup, "STRATEGY_CONFIG_MAP_NAMESPACE"),
            provider_reconcile_interval,
            watch_namespace: non_empty(&lookup, "WATCH_NAMESPACE"),
            error_backoff_min_secs,
            error_backoff_max_secs,
        }
    }
}
