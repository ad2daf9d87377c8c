//! # Reconciliation Errors
//!
//! Every way a pass can end without success.
//!
//! Terminal errors (`ConfigNotFound`, `UnsupportedStrategy`, `Provider`) are
//! recorded on the instance as phase `failed` and are not retried until the
//! object changes. The rest leave status untouched so a later pass can make
//! progress, and are retried with backoff.

use crate::controller::secret::ProjectionError;
use crate::controller::store::StoreError;
use crate::controller::strategy::StrategyError;
use crate::observability::metrics::ProviderOperation;
use crate::provider::ProviderError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("deployment configuration not found: {0}")]
    ConfigNotFound(#[source] StrategyError),

    #[error("failed to look up deployment strategy: {0}")]
    StrategyLookup(#[source] StrategyError),

    #[error("unsupported deployment strategy {strategy}")]
    UnsupportedStrategy { strategy: String },

    #[error("failed to perform provider-specific storage {operation}: {source}")]
    Provider {
        operation: ProviderOperation,
        #[source]
        source: ProviderError,
    },

    #[error("failed to reconcile secret: {0}")]
    Projection(#[from] ProjectionError),

    #[error("status update rejected, will retry: {0}")]
    PersistenceConflict(#[source] StoreError),

    #[error("store error: {0}")]
    Store(#[source] StoreError),

    #[error("reconciliation cancelled")]
    Cancelled,
}

impl From<StoreError> for ReconcileError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Conflict { .. } => ReconcileError::PersistenceConflict(error),
            other => ReconcileError::Store(other),
        }
    }
}

impl ReconcileError {
    /// Classify a failed strategy lookup
    ///
    /// Only a missing or unusable mapping is `ConfigNotFound`; a failed read
    /// of the mapping is retried.
    pub fn from_strategy(error: StrategyError) -> Self {
        if error.is_transient() {
            ReconcileError::StrategyLookup(error)
        } else {
            ReconcileError::ConfigNotFound(error)
        }
    }

    /// Whether a retry without any change to the instance can succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ReconcileError::ConfigNotFound(_)
            | ReconcileError::UnsupportedStrategy { .. }
            | ReconcileError::Provider { .. } => false,
            ReconcileError::StrategyLookup(_)
            | ReconcileError::Projection(_)
            | ReconcileError::PersistenceConflict(_)
            | ReconcileError::Store(_)
            | ReconcileError::Cancelled => true,
        }
    }

    /// Metrics label
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::ConfigNotFound(_) => "config_not_found",
            ReconcileError::StrategyLookup(_) => "strategy_lookup",
            ReconcileError::UnsupportedStrategy { .. } => "unsupported_strategy",
            ReconcileError::Provider { .. } => "provider",
            ReconcileError::Projection(_) => "projection",
            ReconcileError::PersistenceConflict(_) => "conflict",
            ReconcileError::Store(_) => "store",
            ReconcileError::Cancelled => "cancelled",
        }
    }
}
