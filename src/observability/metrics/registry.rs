//! # Metrics Registry
//!
//! Prometheus registry and the metric families registered with it.

use super::{ControllerMetrics, ProviderMetrics};
use anyhow::{Context, Result};
use prometheus::{Encoder, Registry, TextEncoder};

/// All controller metrics plus the registry they are exposed from
#[derive(Debug, Clone)]
pub struct Metrics {
    registry: Registry,
    pub controller: ControllerMetrics,
    pub provider: ProviderMetrics,
}

impl Metrics {
    /// Create and register every metric family
    ///
    /// # Errors
    ///
    /// Returns an error if a metric cannot be created or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let controller = ControllerMetrics::new().context("failed to create controller metrics")?;
        controller
            .register(&registry)
            .context("failed to register controller metrics")?;
        let provider = ProviderMetrics::new().context("failed to create provider metrics")?;
        provider
            .register(&registry)
            .context("failed to register provider metrics")?;

        Ok(Self {
            registry,
            controller,
            provider,
        })
    }

    /// Render all metrics in the Prometheus text exposition format
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails.
    pub fn encode_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_text_contains_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.controller.increment_reconciliations();
        metrics.controller.increment_phase_transitions("complete");

        let text = metrics.encode_text().unwrap();
        assert!(text.contains("blobstorage_reconciliations_total 1"));
        assert!(text.contains("blobstorage_phase_transitions_total{phase=\"complete\"} 1"));
    }

    #[test]
    fn test_instances_are_independent() {
        let a = Metrics::new().unwrap();
        let b = Metrics::new().unwrap();
        a.controller.increment_reconciliations();
        assert_eq!(a.controller.reconciliations(), 1);
        assert_eq!(b.controller.reconciliations(), 0);
    }
}
