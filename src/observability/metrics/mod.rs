//! # Metrics Module
//!
//! Prometheus metrics for monitoring the controller, organized by responsibility.
//!
//! ## Sub-modules
//!
//! - `registry` - The [`Metrics`] bundle owning the Prometheus registry
//! - `controller_metrics` - Pass-level metrics (reconciliations, phases, requeues)
//! - `provider_metrics` - Provider operation metrics (create/delete outcomes)
//!
//! Metrics are owned by a value built once at start-up and shared by `Arc`;
//! there is no process-wide registry.

pub mod controller_metrics;
pub mod provider_metrics;
pub mod registry;

pub use controller_metrics::ControllerMetrics;
pub use provider_metrics::{ProviderMetrics, ProviderOperation};
pub use registry::Metrics;
