//! # Error Policy
//!
//! Decides when a failed pass runs again.
//!
//! Terminal failures are already recorded on the instance status and wait for
//! the instance to change. Retryable failures requeue with a per-instance
//! Fibonacci backoff that resets after the next successful pass.

use crate::controller::reconciler::{ReconcileError, Reconciler};
use crate::crd::{BlobStorage, InstanceKey};
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{info, warn};

const ERROR_BACKOFF_REASON: &str = "error-backoff";

/// Error policy handed to `kube_runtime::Controller::run`
pub fn handle_reconciliation_error(
    instance: Arc<BlobStorage>,
    error: &ReconcileError,
    ctx: Arc<Reconciler>,
) -> Action {
    let key = InstanceKey::from_instance(&instance);
    let span = tracing::warn_span!(
        "controller.watch.reconciliation_error",
        resource.namespace = %key.namespace,
        resource.name = %key.name,
        error = %error,
    );
    let _guard = span.enter();

    if !error.is_retryable() {
        warn!("Waiting for {} to change before retrying: {}", key, error);
        return Action::await_change();
    }

    let (delay, error_count) = ctx.next_error_backoff(&key);
    let next_trigger_time =
        chrono::Utc::now() + chrono::Duration::seconds(delay.as_secs() as i64);
    info!(
        "Retrying {} with Fibonacci backoff: {}s (error count: {}, next retry: {})",
        key,
        delay.as_secs(),
        error_count,
        next_trigger_time.to_rfc3339()
    );

    ctx.metrics().controller.increment_requeues(ERROR_BACKOFF_REASON);
    Action::requeue(delay)
}
