//! # Secret Projection
//!
//! Copies provider connection details into a Kubernetes Secret.
//!
//! The Secret is written with one server-side apply call, so it either lands
//! in full or not at all. It is owned by the BlobStorage instance (and
//! garbage-collected with it) whenever both live in the same namespace;
//! Kubernetes does not allow cross-namespace owners.

use crate::constants::FIELD_MANAGER;
use crate::crd::{BlobStorage, SecretRef};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use kube::api::{Api, ObjectMeta, Patch, PatchParams};
use kube::{Client, Resource, ResourceExt};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Secret write failure
#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to write secret {namespace}/{name}: {source}")]
    Kube {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },

    #[error("failed to write secret {namespace}/{name}: {reason}")]
    Rejected {
        namespace: String,
        name: String,
        reason: String,
    },
}

/// Writes connection details to generically addressable secret storage
#[async_trait]
pub trait SecretProjector: Send + Sync {
    /// Create or replace the Secret at `secret_ref` with exactly `data`
    async fn upsert(
        &self,
        owner: &BlobStorage,
        secret_ref: &SecretRef,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), ProjectionError>;
}

/// Build the Secret object written for an instance
pub fn build_secret(
    owner: &BlobStorage,
    secret_ref: &SecretRef,
    data: BTreeMap<String, Vec<u8>>,
) -> Secret {
    let owner_namespace = owner.namespace().unwrap_or_else(|| "default".to_string());
    let namespace = secret_ref.namespace_or(&owner_namespace).to_string();

    let owner_references = if namespace == owner_namespace {
        owner.controller_owner_ref(&()).map(|r| vec![r])
    } else {
        None
    };

    Secret {
        metadata: ObjectMeta {
            name: Some(secret_ref.name.clone()),
            namespace: Some(namespace),
            labels: Some(BTreeMap::from([
                (
                    "app.kubernetes.io/managed-by".to_string(),
                    FIELD_MANAGER.to_string(),
                ),
                (
                    "integreatly.org/blobstorage".to_string(),
                    owner.name_any(),
                ),
            ])),
            owner_references,
            ..ObjectMeta::default()
        },
        type_: Some("Opaque".to_string()),
        data: Some(
            data.into_iter()
                .map(|(key, value)| (key, ByteString(value)))
                .collect(),
        ),
        ..Secret::default()
    }
}

/// Secret projector backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeSecretProjector {
    client: Client,
}

impl std::fmt::Debug for KubeSecretProjector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretProjector").finish_non_exhaustive()
    }
}

impl KubeSecretProjector {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SecretProjector for KubeSecretProjector {
    async fn upsert(
        &self,
        owner: &BlobStorage,
        secret_ref: &SecretRef,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), ProjectionError> {
        let secret = build_secret(owner, secret_ref, data);
        let namespace = secret.metadata.namespace.clone().unwrap_or_default();
        let name = secret_ref.name.clone();

        if name.is_empty() {
            return Err(ProjectionError::Rejected {
                namespace,
                name,
                reason: "secret name is empty".to_string(),
            });
        }

        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        api.patch(&name, &PatchParams::apply(FIELD_MANAGER).force(), &Patch::Apply(&secret))
            .await
            .map_err(|source| ProjectionError::Kube {
                namespace: namespace.clone(),
                name: name.clone(),
                source,
            })?;

        debug!(secret.namespace = %namespace, secret.name = %name, "projected connection secret");
        Ok(())
    }
}
