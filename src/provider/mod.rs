//! # Storage Providers
//!
//! Abstract interface for blob storage backends.
//!
//! Each provider implements one strategy family (a cloud object store, an
//! in-cluster equivalent, ...). The reconciler never talks to a backend
//! directly; it picks the first registered provider that supports the
//! resolved strategy and drives it through this trait.

pub mod openshift;
mod registry;

pub use openshift::OpenShiftBlobStorageProvider;
pub use registry::ProviderRegistry;

use crate::crd::{BlobStorage, StatusMessage};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;

/// Boxed error returned by backend calls
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Provider trait for blob storage backends
#[async_trait]
pub trait BlobStorageProvider: Send + Sync {
    /// Name recorded in status as the provider that fulfilled the instance
    fn name(&self) -> &str;

    /// Whether this provider implements the given strategy identifier
    fn supports_strategy(&self, strategy: &str) -> bool;

    /// How long to wait before re-checking this instance
    fn reconcile_interval(&self, instance: &BlobStorage) -> Duration;

    /// Create (or verify) the backend storage for an instance
    ///
    /// Returns `Converging` while the backend is still provisioning.
    ///
    /// A provider that writes the instance itself (finalizers, annotations)
    /// must copy the metadata returned by the API server back into
    /// `instance`. The status write that ends the pass is conditional on
    /// `resourceVersion` and would otherwise conflict with that write.
    async fn create_storage(
        &self,
        instance: &mut BlobStorage,
    ) -> Result<CreateOutcome, ProviderError>;

    /// Start (or continue) removing the backend storage for an instance
    ///
    /// Same metadata contract as [`create_storage`](Self::create_storage).
    async fn delete_storage(
        &self,
        instance: &mut BlobStorage,
    ) -> Result<StatusMessage, ProviderError>;
}

/// Result of a provider create call that did not fail
#[derive(Debug, Clone, PartialEq)]
pub enum CreateOutcome {
    /// Storage exists; connection details are ready to project
    Ready {
        instance: BlobStorageInstance,
        message: StatusMessage,
    },
    /// Backend is still provisioning; nothing to project yet
    Converging { message: StatusMessage },
}

/// Backend storage produced by a provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobStorageInstance {
    pub deployment_details: BlobStorageDeploymentDetails,
}

/// Connection details for a provisioned bucket
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobStorageDeploymentDetails {
    pub bucket_name: String,
    pub bucket_region: String,
    pub credential_key_id: String,
    pub credential_secret_key: String,
}

impl BlobStorageDeploymentDetails {
    /// Flat Secret data, one entry per connection parameter
    pub fn data(&self) -> BTreeMap<String, Vec<u8>> {
        BTreeMap::from([
            ("bucketName".to_string(), self.bucket_name.as_bytes().to_vec()),
            ("bucketRegion".to_string(), self.bucket_region.as_bytes().to_vec()),
            (
                "credentialKeyID".to_string(),
                self.credential_key_id.as_bytes().to_vec(),
            ),
            (
                "credentialSecretKey".to_string(),
                self.credential_secret_key.as_bytes().to_vec(),
            ),
        ])
    }
}

/// Backend failure reported by a provider
///
/// Carries the status message the provider wants recorded; the final status
/// message is `"<message>: <source>"`.
#[derive(Debug, thiserror::Error)]
#[error("{message}: {source}")]
pub struct ProviderError {
    pub message: StatusMessage,
    #[source]
    pub source: BoxError,
}

impl ProviderError {
    pub fn new(message: impl Into<StatusMessage>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Message recorded on the instance status
    pub fn status_message(&self) -> StatusMessage {
        self.message.wrap_error(&self.source)
    }
}
