//! # OpenShift Blob Storage Provider
//!
//! In-cluster strategy family. There is no external bucket to create: the
//! provider only holds a finalizer on the instance so deletion goes through
//! the reconciler, and reports empty connection details.

use crate::constants::{BLOB_STORAGE_FINALIZER, FIELD_MANAGER};
use crate::crd::{BlobStorage, StatusMessage};
use crate::provider::{
    BlobStorageDeploymentDetails, BlobStorageInstance, BlobStorageProvider, CreateOutcome,
    ProviderError,
};
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use std::time::Duration;
use tracing::{debug, info};

/// Strategy identifier served by this provider
pub const OPENSHIFT_STRATEGY: &str = "openshift";

/// Provider name recorded in status
pub const OPENSHIFT_PROVIDER_NAME: &str = "openshift-blobstorage";

/// In-cluster blob storage provider
#[derive(Clone)]
pub struct OpenShiftBlobStorageProvider {
    client: Client,
    reconcile_interval: Duration,
}

impl std::fmt::Debug for OpenShiftBlobStorageProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenShiftBlobStorageProvider")
            .field("reconcile_interval", &self.reconcile_interval)
            .finish_non_exhaustive()
    }
}

impl OpenShiftBlobStorageProvider {
    pub fn new(client: Client, reconcile_interval: Duration) -> Self {
        Self {
            client,
            reconcile_interval,
        }
    }

    /// Write `finalizers` and adopt the metadata the API server returns
    async fn patch_finalizers(
        &self,
        instance: &mut BlobStorage,
        finalizers: Vec<String>,
    ) -> Result<(), kube::Error> {
        let namespace = instance.namespace().unwrap_or_else(|| "default".to_string());
        let api: Api<BlobStorage> = Api::namespaced(self.client.clone(), &namespace);
        let patch = serde_json::json!({
            "metadata": {
                "finalizers": finalizers
            }
        });
        let updated = api
            .patch(
                &instance.name_any(),
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await?;
        adopt_metadata(instance, updated);
        Ok(())
    }
}

/// Take the server's metadata so later writes carry its `resourceVersion`
fn adopt_metadata(instance: &mut BlobStorage, updated: BlobStorage) {
    instance.metadata = updated.metadata;
}

/// Finalizer list with ours appended, or `None` when already present
fn with_finalizer(current: &[String]) -> Option<Vec<String>> {
    if current.iter().any(|f| f == BLOB_STORAGE_FINALIZER) {
        return None;
    }
    let mut finalizers = current.to_vec();
    finalizers.push(BLOB_STORAGE_FINALIZER.to_string());
    Some(finalizers)
}

/// Finalizer list with ours removed, or `None` when it was not there
fn without_finalizer(current: &[String]) -> Option<Vec<String>> {
    if !current.iter().any(|f| f == BLOB_STORAGE_FINALIZER) {
        return None;
    }
    Some(
        current
            .iter()
            .filter(|f| f.as_str() != BLOB_STORAGE_FINALIZER)
            .cloned()
            .collect(),
    )
}

#[async_trait]
impl BlobStorageProvider for OpenShiftBlobStorageProvider {
    fn name(&self) -> &str {
        OPENSHIFT_PROVIDER_NAME
    }

    fn supports_strategy(&self, strategy: &str) -> bool {
        strategy == OPENSHIFT_STRATEGY
    }

    fn reconcile_interval(&self, _instance: &BlobStorage) -> Duration {
        self.reconcile_interval
    }

    async fn create_storage(
        &self,
        instance: &mut BlobStorage,
    ) -> Result<CreateOutcome, ProviderError> {
        if let Some(finalizers) = with_finalizer(instance.finalizers()) {
            debug!(finalizer = BLOB_STORAGE_FINALIZER, "adding finalizer");
            self.patch_finalizers(instance, finalizers)
                .await
                .map_err(|e| ProviderError::new("failed to add finalizer to instance", e))?;
        }

        Ok(CreateOutcome::Ready {
            instance: BlobStorageInstance {
                deployment_details: BlobStorageDeploymentDetails::default(),
            },
            message: StatusMessage::new("creation successful"),
        })
    }

    async fn delete_storage(
        &self,
        instance: &mut BlobStorage,
    ) -> Result<StatusMessage, ProviderError> {
        if let Some(finalizers) = without_finalizer(instance.finalizers()) {
            info!(finalizer = BLOB_STORAGE_FINALIZER, "removing finalizer");
            self.patch_finalizers(instance, finalizers)
                .await
                .map_err(|e| ProviderError::new("failed to remove finalizer from instance", e))?;
        }
        Ok(StatusMessage::new("deletion successful"))
    }
}
