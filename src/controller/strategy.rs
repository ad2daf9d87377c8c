//! # Strategy Resolution
//!
//! Maps a deployment type to the blob storage strategy identifier.
//!
//! The mapping lives in a ConfigMap (`cloud-resource-config` by default). Each
//! data key is a deployment type and each value is a JSON object naming the
//! strategy per resource family:
//!
//! ```yaml
//! data:
//!   managed: '{"blobstorage": "aws", "redis": "aws"}'
//!   workshop: '{"blobstorage": "openshift", "redis": "openshift"}'
//! ```
//!
//! When the ConfigMap does not exist the built-in default mapping is used.

use crate::constants::BLOB_STORAGE_STRATEGY_KEY;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::Api;
use kube::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

/// Strategy lookup failure
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("strategy for deployment type {deployment_type} is not defined")]
    NotDefined { deployment_type: String },

    #[error("strategy mapping for deployment type {deployment_type} is malformed: {source}")]
    Malformed {
        deployment_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read strategy config map {namespace}/{name}: {source}")]
    Kube {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
}

impl StrategyError {
    /// The lookup itself failed, so nothing is known about the mapping yet
    pub fn is_transient(&self) -> bool {
        matches!(self, StrategyError::Kube { .. })
    }
}

/// Read-only lookup from deployment type to strategy identifier
#[async_trait]
pub trait StrategyResolver: Send + Sync {
    async fn resolve(&self, namespace: &str, deployment_type: &str)
        -> Result<String, StrategyError>;
}

/// Strategy per resource family for one deployment type
#[derive(Debug, Deserialize)]
struct DeploymentStrategyMapping {
    #[serde(rename = "blobstorage", default)]
    blob_storage: Option<String>,
}

/// Built-in mapping used when no strategy ConfigMap exists
pub fn default_strategy_config() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "managed".to_string(),
            r#"{"blobstorage": "aws", "redis": "aws", "postgres": "aws", "smtpCredentials": "aws"}"#
                .to_string(),
        ),
        (
            "workshop".to_string(),
            r#"{"blobstorage": "openshift", "redis": "openshift", "postgres": "openshift", "smtpCredentials": "openshift"}"#
                .to_string(),
        ),
    ])
}

/// Pick the blob storage strategy for `deployment_type` out of ConfigMap data
pub fn strategy_from_config_data(
    data: &BTreeMap<String, String>,
    deployment_type: &str,
) -> Result<String, StrategyError> {
    let raw = data
        .get(deployment_type)
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| StrategyError::NotDefined {
            deployment_type: deployment_type.to_string(),
        })?;

    let mapping: DeploymentStrategyMapping =
        serde_json::from_str(raw).map_err(|source| StrategyError::Malformed {
            deployment_type: deployment_type.to_string(),
            source,
        })?;

    mapping
        .blob_storage
        .filter(|s| !s.is_empty())
        .ok_or_else(|| StrategyError::NotDefined {
            deployment_type: deployment_type.to_string(),
        })
}

/// Strategy resolver backed by a Kubernetes ConfigMap
#[derive(Clone)]
pub struct ConfigMapStrategyResolver {
    client: Client,
    config_map_name: String,
    /// Fixed namespace for the ConfigMap; the instance namespace when `None`
    config_map_namespace: Option<String>,
}

impl std::fmt::Debug for ConfigMapStrategyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMapStrategyResolver")
            .field("config_map_name", &self.config_map_name)
            .field("config_map_namespace", &self.config_map_namespace)
            .finish_non_exhaustive()
    }
}

impl ConfigMapStrategyResolver {
    pub fn new(
        client: Client,
        config_map_name: impl Into<String>,
        config_map_namespace: Option<String>,
    ) -> Self {
        Self {
            client,
            config_map_name: config_map_name.into(),
            config_map_namespace,
        }
    }
}

#[async_trait]
impl StrategyResolver for ConfigMapStrategyResolver {
    async fn resolve(
        &self,
        namespace: &str,
        deployment_type: &str,
    ) -> Result<String, StrategyError> {
        let cm_namespace = self.config_map_namespace.as_deref().unwrap_or(namespace);
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), cm_namespace);

        let config_map = api
            .get_opt(&self.config_map_name)
            .await
            .map_err(|source| StrategyError::Kube {
                namespace: cm_namespace.to_string(),
                name: self.config_map_name.clone(),
                source,
            })?;

        let data = match config_map {
            Some(cm) => cm.data.unwrap_or_default(),
            None => {
                debug!(
                    config_map = %self.config_map_name,
                    namespace = %cm_namespace,
                    "strategy config map not found, using default mapping"
                );
                default_strategy_config()
            }
        };

        strategy_from_config_data(&data, deployment_type)
    }
}
