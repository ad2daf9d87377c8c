//! # BlobStorage Controller
//!
//! A Kubernetes controller that provisions blob storage for `BlobStorage`
//! resources through pluggable storage providers.
//!
//! ## Overview
//!
//! For every `BlobStorage` instance the controller:
//!
//! 1. **Resolves a strategy** - Maps the declared deployment type to a strategy
//!    identifier through the `cloud-resource-config` ConfigMap
//! 2. **Selects a provider** - Picks the first registered provider that
//!    supports the strategy
//! 3. **Creates or deletes storage** - Depending on whether the instance is
//!    marked for deletion
//! 4. **Projects connection details** - Writes bucket name, region and
//!    credentials into the Secret named by `spec.secretRef`
//! 5. **Records status** - Phase, message, strategy and provider
//!
//! ## Features
//!
//! - **Pluggable providers**: Storage backends implement [`provider::BlobStorageProvider`]
//! - **Testable passes**: Every collaborator sits behind a trait
//! - **Prometheus metrics**: Exposed on `/metrics`
//! - **Health probes**: `/healthz` and `/readyz`

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod provider;
pub mod runtime;

pub use controller::reconciler::{
    reconcile, PassOutcome, ReconcileError, Reconciler, ShutdownSignal, ShutdownTrigger,
};
pub use crd::{BlobStorage, BlobStorageSpec, BlobStorageStatus, InstanceKey, StatusPhase};
