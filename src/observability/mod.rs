//! # Observability
//!
//! Prometheus metrics and tracing set-up for the controller.

pub mod metrics;
pub mod logging;
