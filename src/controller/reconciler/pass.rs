//! # Reconciliation Pass
//!
//! One pass over a single instance. Each collaborator call races the
//! shutdown signal, and every status write is skipped when nothing changed.

use super::shutdown::cancellable;
use super::status;
use super::{PassOutcome, ReconcileError, Reconciler, ShutdownSignal};
use crate::controller::store::StoreError;
use crate::crd::{BlobStorage, BlobStorageStatus, InstanceKey};
use crate::observability::metrics::ProviderOperation;
use crate::provider::{BlobStorageProvider, CreateOutcome};
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

const REQUEUE_REASON: &str = "provider-interval";

impl Reconciler {
    /// Run one pass for `key`
    ///
    /// # Errors
    ///
    /// Terminal failures are written to the instance status before being
    /// returned. Retryable failures leave the status as it was.
    pub async fn reconcile_pass(
        &self,
        key: &InstanceKey,
        shutdown: &ShutdownSignal,
    ) -> Result<PassOutcome, ReconcileError> {
        let span = info_span!(
            "blobstorage.reconcile",
            resource.namespace = %key.namespace,
            resource.name = %key.name,
        );

        async move {
            let start = Instant::now();
            self.metrics.controller.increment_reconciliations();

            let result = self.run_pass(key, shutdown).await;

            self.metrics
                .controller
                .observe_reconciliation_duration(start.elapsed().as_secs_f64());
            match &result {
                Ok(PassOutcome::RequeueAfter(delay)) => {
                    self.metrics.controller.increment_requeues(REQUEUE_REASON);
                    debug!("Requeueing in {}s", delay.as_secs());
                }
                Ok(PassOutcome::Done) => {}
                Err(e) => {
                    self.metrics
                        .controller
                        .increment_reconciliation_errors(e.reason());
                    if e.is_retryable() {
                        warn!("Reconciliation failed, will retry: {}", e);
                    } else {
                        warn!("Reconciliation failed: {}", e);
                    }
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_pass(
        &self,
        key: &InstanceKey,
        shutdown: &ShutdownSignal,
    ) -> Result<PassOutcome, ReconcileError> {
        if shutdown.is_shutdown() {
            return Err(ReconcileError::Cancelled);
        }

        let Some(mut instance) = cancellable(shutdown, self.store.get(key)).await?? else {
            debug!("BlobStorage {} not found, nothing to reconcile", key);
            return Ok(PassOutcome::Done);
        };
        info!("Reconciling BlobStorage {}", key);

        let deployment_type = instance.spec.deployment_type.as_str();
        let strategy = match cancellable(
            shutdown,
            self.strategies.resolve(&key.namespace, deployment_type),
        )
        .await?
        {
            Ok(strategy) => strategy,
            Err(e) if e.is_transient() => return Err(ReconcileError::from_strategy(e)),
            Err(e) => {
                let err = ReconcileError::from_strategy(e);
                let next = status::failed(&instance, err.to_string().into());
                self.write_status(&instance, next, shutdown).await?;
                return Err(err);
            }
        };
        debug!("Deployment type {} resolved to strategy {}", deployment_type, strategy);

        let Some(provider) = self.providers.select(&strategy) else {
            let err = ReconcileError::UnsupportedStrategy { strategy };
            let next = status::failed(&instance, err.to_string().into());
            self.write_status(&instance, next, shutdown).await?;
            return Err(err);
        };
        debug!("Using provider {}", provider.name());

        if instance.is_being_deleted() {
            self.delete(&mut instance, &**provider, shutdown).await
        } else {
            self.create(&mut instance, &strategy, &**provider, shutdown)
                .await
        }
    }

    async fn delete(
        &self,
        instance: &mut BlobStorage,
        provider: &dyn BlobStorageProvider,
        shutdown: &ShutdownSignal,
    ) -> Result<PassOutcome, ReconcileError> {
        let start = Instant::now();
        let result = cancellable(shutdown, provider.delete_storage(instance)).await?;
        let elapsed = start.elapsed().as_secs_f64();
        let instance = &*instance;

        match result {
            Err(e) => {
                self.metrics
                    .provider
                    .record(provider.name(), ProviderOperation::Delete, "error", elapsed);
                let next = status::failed(instance, e.status_message());
                self.write_status(instance, next, shutdown).await?;
                Err(ReconcileError::Provider {
                    operation: ProviderOperation::Delete,
                    source: e,
                })
            }
            Ok(message) => {
                self.metrics
                    .provider
                    .record(provider.name(), ProviderOperation::Delete, "ok", elapsed);
                info!("Waiting on blob storage to successfully delete");
                let next = status::deleting(instance, message);
                self.write_status(instance, next, shutdown).await?;
                Ok(PassOutcome::RequeueAfter(provider.reconcile_interval(instance)))
            }
        }
    }

    async fn create(
        &self,
        instance: &mut BlobStorage,
        strategy: &str,
        provider: &dyn BlobStorageProvider,
        shutdown: &ShutdownSignal,
    ) -> Result<PassOutcome, ReconcileError> {
        let start = Instant::now();
        let result = cancellable(shutdown, provider.create_storage(instance)).await?;
        let elapsed = start.elapsed().as_secs_f64();
        let instance = &*instance;

        let outcome = match result {
            Err(e) => {
                self.metrics
                    .provider
                    .record(provider.name(), ProviderOperation::Create, "error", elapsed);
                let next = status::create_failed(instance, e.status_message());
                self.write_status(instance, next, shutdown).await?;
                return Err(ReconcileError::Provider {
                    operation: ProviderOperation::Create,
                    source: e,
                });
            }
            Ok(outcome) => outcome,
        };

        match outcome {
            CreateOutcome::Converging { message } => {
                self.metrics.provider.record(
                    provider.name(),
                    ProviderOperation::Create,
                    "converging",
                    elapsed,
                );
                info!("Blob storage is not ready yet: {}", message);
                let next = status::in_progress(instance, message);
                self.write_status(instance, next, shutdown).await?;
            }
            CreateOutcome::Ready {
                instance: storage,
                message,
            } => {
                self.metrics.provider.record(
                    provider.name(),
                    ProviderOperation::Create,
                    "ready",
                    elapsed,
                );
                match &instance.spec.secret_ref {
                    Some(secret_ref) => {
                        let data = storage.deployment_details.data();
                        cancellable(shutdown, self.projector.upsert(instance, secret_ref, data))
                            .await??;
                        debug!("Connection details written to secret {}", secret_ref.name);
                    }
                    None => debug!("No secretRef declared, skipping secret projection"),
                }
                let next = status::complete(instance, message, strategy, provider.name());
                self.write_status(instance, next, shutdown).await?;
                info!("Blob storage reconciled successfully");
            }
        }

        Ok(PassOutcome::RequeueAfter(provider.reconcile_interval(instance)))
    }

    async fn write_status(
        &self,
        instance: &BlobStorage,
        next: BlobStorageStatus,
        shutdown: &ShutdownSignal,
    ) -> Result<(), ReconcileError> {
        if status::is_unchanged(instance, &next) {
            debug!("Status unchanged, skipping update");
            return Ok(());
        }

        let phase = next.phase;
        match cancellable(shutdown, self.store.update_status(instance, next)).await? {
            Ok(()) => {}
            Err(StoreError::NotFound { key }) => {
                // finalizer already released, the object is gone
                debug!("{} was removed before its status could be written", key);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        }
        self.metrics.controller.increment_phase_transitions(phase.as_str());
        info!("Status updated: phase={}", phase);
        Ok(())
    }
}
