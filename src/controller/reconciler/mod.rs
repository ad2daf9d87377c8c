//! # Reconciler
//!
//! Drives one BlobStorage instance toward the state its spec declares.
//!
//! A pass loads the instance, resolves its deployment type to a strategy,
//! picks the first registered provider that supports the strategy, then
//! either tears the storage down (instance marked for deletion) or creates it
//! and projects connection details into the referenced Secret. Every outcome
//! is recorded on the instance status.
//!
//! Collaborators sit behind traits so passes can run against in-memory fakes:
//! - [`InstanceStore`] for reads and status writes
//! - [`StrategyResolver`] for deployment type lookup
//! - [`ProviderRegistry`] for provider selection
//! - [`SecretProjector`] for connection detail Secrets

mod error;
mod pass;
mod shutdown;
mod status;

pub use error::ReconcileError;
pub use shutdown::{ShutdownSignal, ShutdownTrigger};

use crate::constants;
use crate::controller::backoff::BackoffState;
use crate::controller::secret::SecretProjector;
use crate::controller::store::InstanceStore;
use crate::controller::strategy::StrategyResolver;
use crate::crd::{BlobStorage, InstanceKey};
use crate::observability::metrics::Metrics;
use crate::provider::ProviderRegistry;
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// What the caller should do once a pass succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Nothing left to do until the instance changes
    Done,
    /// Run another pass after the delay
    RequeueAfter(Duration),
}

impl PassOutcome {
    pub fn requeue_after(&self) -> Option<Duration> {
        match self {
            PassOutcome::Done => None,
            PassOutcome::RequeueAfter(delay) => Some(*delay),
        }
    }

    pub fn into_action(self) -> Action {
        match self {
            PassOutcome::Done => Action::await_change(),
            PassOutcome::RequeueAfter(delay) => Action::requeue(delay),
        }
    }
}

/// Reconciler context shared by every pass
pub struct Reconciler {
    store: Arc<dyn InstanceStore>,
    strategies: Arc<dyn StrategyResolver>,
    providers: ProviderRegistry,
    projector: Arc<dyn SecretProjector>,
    metrics: Arc<Metrics>,
    shutdown: ShutdownSignal,
    error_backoff_min_secs: u64,
    error_backoff_max_secs: u64,
    backoff_states: Mutex<HashMap<InstanceKey, BackoffState>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("providers", &self.providers)
            .field("error_backoff_min_secs", &self.error_backoff_min_secs)
            .field("error_backoff_max_secs", &self.error_backoff_max_secs)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn InstanceStore>,
        strategies: Arc<dyn StrategyResolver>,
        providers: ProviderRegistry,
        projector: Arc<dyn SecretProjector>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            store,
            strategies,
            providers,
            projector,
            metrics,
            shutdown: ShutdownSignal::never(),
            error_backoff_min_secs: constants::DEFAULT_ERROR_BACKOFF_MIN_SECS,
            error_backoff_max_secs: constants::DEFAULT_ERROR_BACKOFF_MAX_SECS,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Signal used by passes started from the watch loop
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Bounds for the retry delay after retryable failures
    pub fn with_error_backoff(mut self, min_secs: u64, max_secs: u64) -> Self {
        self.error_backoff_min_secs = min_secs.max(1);
        self.error_backoff_max_secs = max_secs.max(self.error_backoff_min_secs);
        self
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Record a failure for `key` and return the delay before its next pass
    /// together with the number of consecutive failures
    pub fn next_error_backoff(&self, key: &InstanceKey) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(key.clone()).or_insert_with(|| {
                    BackoffState::new(self.error_backoff_min_secs, self.error_backoff_max_secs)
                });
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff states: {}, using minimum backoff", e);
                (Duration::from_secs(self.error_backoff_min_secs), 0)
            }
        }
    }

    /// Forget the failure history of `key` after a successful pass
    pub fn reset_backoff(&self, key: &InstanceKey) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                states.remove(key);
            }
            Err(e) => warn!("Failed to lock backoff states: {}", e),
        }
    }
}

/// Entry point used by `kube_runtime::Controller`
///
/// # Errors
///
/// Returns the pass error; the error policy decides whether and when to retry.
pub async fn reconcile(
    instance: Arc<BlobStorage>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcileError> {
    let key = InstanceKey::from_instance(&instance);
    let outcome = ctx.reconcile_pass(&key, &ctx.shutdown).await?;
    ctx.reset_backoff(&key);
    Ok(outcome.into_action())
}
