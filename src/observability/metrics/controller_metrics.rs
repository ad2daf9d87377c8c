//! # Controller Metrics
//!
//! Metrics for reconciliation passes: runs, failures, duration, phase
//! transitions and requeues.

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

/// Pass-level metrics
#[derive(Debug, Clone)]
pub struct ControllerMetrics {
    reconciliations_total: IntCounter,
    reconciliation_errors_total: IntCounterVec,
    reconciliation_duration: Histogram,
    phase_transitions_total: IntCounterVec,
    requeues_total: IntCounterVec,
}

impl ControllerMetrics {
    pub(crate) fn new() -> Result<Self> {
        Ok(Self {
            reconciliations_total: IntCounter::new(
                "blobstorage_reconciliations_total",
                "Total number of reconciliation passes",
            )?,
            reconciliation_errors_total: IntCounterVec::new(
                Opts::new(
                    "blobstorage_reconciliation_errors_total",
                    "Total number of failed reconciliation passes",
                ),
                &["reason"],
            )?,
            reconciliation_duration: Histogram::with_opts(
                HistogramOpts::new(
                    "blobstorage_reconciliation_duration_seconds",
                    "Duration of reconciliation passes in seconds",
                )
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
            )?,
            phase_transitions_total: IntCounterVec::new(
                Opts::new(
                    "blobstorage_phase_transitions_total",
                    "Total number of status writes by resulting phase",
                ),
                &["phase"],
            )?,
            requeues_total: IntCounterVec::new(
                Opts::new(
                    "blobstorage_requeues_total",
                    "Total number of requested requeues",
                ),
                &["reason"],
            )?,
        })
    }

    pub(crate) fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.reconciliations_total.clone()))?;
        registry.register(Box::new(self.reconciliation_errors_total.clone()))?;
        registry.register(Box::new(self.reconciliation_duration.clone()))?;
        registry.register(Box::new(self.phase_transitions_total.clone()))?;
        registry.register(Box::new(self.requeues_total.clone()))?;
        Ok(())
    }

    pub fn increment_reconciliations(&self) {
        self.reconciliations_total.inc();
    }

    pub fn reconciliations(&self) -> u64 {
        self.reconciliations_total.get()
    }

    pub fn increment_reconciliation_errors(&self, reason: &str) {
        self.reconciliation_errors_total
            .with_label_values(&[reason])
            .inc();
    }

    pub fn reconciliation_errors(&self, reason: &str) -> u64 {
        self.reconciliation_errors_total
            .with_label_values(&[reason])
            .get()
    }

    pub fn observe_reconciliation_duration(&self, seconds: f64) {
        self.reconciliation_duration.observe(seconds);
    }

    pub fn increment_phase_transitions(&self, phase: &str) {
        self.phase_transitions_total.with_label_values(&[phase]).inc();
    }

    pub fn phase_transitions(&self, phase: &str) -> u64 {
        self.phase_transitions_total.with_label_values(&[phase]).get()
    }

    pub fn increment_requeues(&self, reason: &str) {
        self.requeues_total.with_label_values(&[reason]).inc();
    }

    pub fn requeues(&self, reason: &str) -> u64 {
        self.requeues_total.with_label_values(&[reason]).get()
    }
}
