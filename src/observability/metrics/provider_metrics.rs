//! # Provider Metrics
//!
//! Outcome counters and latency for provider create/delete calls.

use anyhow::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::fmt;

/// Provider call being measured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderOperation {
    Create,
    Delete,
}

impl ProviderOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderOperation::Create => "create",
            ProviderOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for ProviderOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provider operation metrics
#[derive(Debug, Clone)]
pub struct ProviderMetrics {
    operations_total: IntCounterVec,
    operation_duration: HistogramVec,
}

impl ProviderMetrics {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            operations_total: IntCounterVec::new(
                Opts::new(
                    "blobstorage_provider_operations_total",
                    "Total number of provider operations by outcome",
                ),
                &["provider", "operation", "outcome"],
            )?,
            operation_duration: HistogramVec::new(
                HistogramOpts::new(
                    "blobstorage_provider_operation_duration_seconds",
                    "Duration of provider operations in seconds",
                )
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0]),
                &["provider", "operation"],
            )?,
        })
    }

    pub(crate) fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.operations_total.clone()))?;
        registry.register(Box::new(self.operation_duration.clone()))?;
        Ok(())
    }

    /// Record one provider call; `outcome` is e.g. "ready", "converging", "error"
    pub fn record(&self, provider: &str, operation: ProviderOperation, outcome: &str, seconds: f64) {
        self.operations_total
            .with_label_values(&[provider, operation.as_str(), outcome])
            .inc();
        self.operation_duration
            .with_label_values(&[provider, operation.as_str()])
            .observe(seconds);
    }

    pub fn operations(&self, provider: &str, operation: ProviderOperation, outcome: &str) -> u64 {
        self.operations_total
            .with_label_values(&[provider, operation.as_str(), outcome])
            .get()
    }
}
