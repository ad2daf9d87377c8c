//! # Instance Store
//!
//! Reads BlobStorage instances and writes their status.
//!
//! Status patches carry the `resourceVersion` of the snapshot they were
//! computed from, so a concurrent writer makes the API server answer 409 and
//! the write surfaces as [`StoreError::Conflict`]. Conflicts are never merged
//! locally; the next pass re-reads.

use crate::constants::FIELD_MANAGER;
use crate::crd::{BlobStorage, BlobStorageStatus, InstanceKey};
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube::{Client, ResourceExt};
use thiserror::Error;

/// Store access failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("status update for {key} conflicted with a newer version")]
    Conflict { key: InstanceKey },

    #[error("{key} no longer exists")]
    NotFound { key: InstanceKey },

    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Declarative store for BlobStorage desired and observed state
#[async_trait]
pub trait InstanceStore: Send + Sync {
    /// Fetch the instance, `None` when it no longer exists
    async fn get(&self, key: &InstanceKey) -> Result<Option<BlobStorage>, StoreError>;

    /// Replace the status of `instance` with `status`
    ///
    /// Rejected with [`StoreError::Conflict`] when `instance` is stale and
    /// [`StoreError::NotFound`] when it was removed in the meantime.
    async fn update_status(
        &self,
        instance: &BlobStorage,
        status: BlobStorageStatus,
    ) -> Result<(), StoreError>;
}

/// Instance store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeInstanceStore {
    client: Client,
}

impl std::fmt::Debug for KubeInstanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeInstanceStore").finish_non_exhaustive()
    }
}

impl KubeInstanceStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InstanceStore for KubeInstanceStore {
    async fn get(&self, key: &InstanceKey) -> Result<Option<BlobStorage>, StoreError> {
        let api: Api<BlobStorage> = Api::namespaced(self.client.clone(), &key.namespace);
        Ok(api.get_opt(&key.name).await?)
    }

    async fn update_status(
        &self,
        instance: &BlobStorage,
        status: BlobStorageStatus,
    ) -> Result<(), StoreError> {
        let key = InstanceKey::from_instance(instance);
        let api: Api<BlobStorage> = Api::namespaced(self.client.clone(), &key.namespace);

        let patch = serde_json::json!({
            "metadata": {
                "resourceVersion": instance.resource_version(),
            },
            "status": serde_json::to_value(&status)?,
        });

        match api
            .patch_status(
                &instance.name_any(),
                &PatchParams::apply(FIELD_MANAGER),
                &Patch::Merge(&patch),
            )
            .await
        {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(ae)) if ae.code == 409 => Err(StoreError::Conflict { key }),
            Err(kube::Error::Api(ae)) if ae.code == 404 => Err(StoreError::NotFound { key }),
            Err(e) => Err(StoreError::Kube(e)),
        }
    }
}
