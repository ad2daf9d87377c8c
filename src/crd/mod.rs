//! # Custom Resource Definitions
//!
//! CRD types for the BlobStorage controller.
//!
//! A `BlobStorage` declares that a namespace wants a bucket-like storage
//! resource. The deployment `type` selects which strategy family (and so
//! which provider) fulfils it; connection details end up in the Secret named
//! by `secretRef`.

mod status;

pub use status::{BlobStorageStatus, StatusMessage, StatusPhase};

use kube::{CustomResource, ResourceExt};
use serde::{Deserialize, Serialize};
use std::fmt;

/// BlobStorage Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: integreatly.org/v1alpha1
/// kind: BlobStorage
/// metadata:
///   name: backups
///   namespace: my-app
/// spec:
///   type: workshop
///   secretRef:
///     name: backups-connection
/// ```
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "BlobStorage",
    group = "integreatly.org",
    version = "v1alpha1",
    namespaced,
    status = "BlobStorageStatus",
    shortname = "bs",
    printcolumn = r#"{"name":"Phase", "type":"string", "jsonPath":".status.phase"}, {"name":"Strategy", "type":"string", "jsonPath":".status.strategy"}, {"name":"Provider", "type":"string", "jsonPath":".status.provider"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct BlobStorageSpec {
    /// Deployment type used to look up the storage strategy (e.g. "managed", "workshop")
    #[serde(rename = "type")]
    pub deployment_type: String,
    /// Service tier requested from the backend; informational for built-in providers
    #[serde(default)]
    pub tier: Option<String>,
    /// Where connection details are written once storage is provisioned
    #[serde(default)]
    pub secret_ref: Option<SecretRef>,
}

/// Reference to the Secret that receives connection details
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretRef {
    /// Secret name
    pub name: String,
    /// Secret namespace; the instance namespace when omitted
    #[serde(default)]
    pub namespace: Option<String>,
}

impl SecretRef {
    /// Namespace the Secret lives in, falling back to the owning instance's namespace
    pub fn namespace_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.namespace
            .as_deref()
            .filter(|ns| !ns.is_empty())
            .unwrap_or(fallback)
    }
}

/// Namespace-qualified identity of a BlobStorage instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    pub namespace: String,
    pub name: String,
}

impl InstanceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Identity of an object handed over by the watcher
    pub fn from_instance(instance: &BlobStorage) -> Self {
        Self {
            namespace: instance.namespace().unwrap_or_else(|| "default".to_string()),
            name: instance.name_any(),
        }
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

impl BlobStorage {
    /// Whether an external actor has asked for this instance to be removed
    pub fn is_being_deleted(&self) -> bool {
        self.metadata.deletion_timestamp.is_some()
    }

    /// Current phase, treating a missing status as `Pending`
    pub fn phase(&self) -> StatusPhase {
        self.status
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kube::CustomResourceExt;

    fn sample() -> BlobStorage {
        serde_json::from_value(serde_json::json!({
            "apiVersion": "integreatly.org/v1alpha1",
            "kind": "BlobStorage",
            "metadata": { "name": "backups", "namespace": "my-app" },
            "spec": {
                "type": "workshop",
                "tier": "development",
                "secretRef": { "name": "backups-connection" }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_spec_deserializes_type_field() {
        let bs = sample();
        assert_eq!(bs.spec.deployment_type, "workshop");
        assert_eq!(bs.spec.tier.as_deref(), Some("development"));
        assert_eq!(
            bs.spec.secret_ref,
            Some(SecretRef {
                name: "backups-connection".to_string(),
                namespace: None,
            })
        );
    }

    #[test]
    fn test_missing_status_reads_as_pending() {
        let bs = sample();
        assert!(bs.status.is_none());
        assert_eq!(bs.phase(), StatusPhase::Pending);
        assert!(!bs.is_being_deleted());
    }

    #[test]
    fn test_deletion_timestamp_marks_deletion() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["metadata"]["deletionTimestamp"] = serde_json::json!("2024-05-01T10:00:00Z");
        let bs: BlobStorage = serde_json::from_value(value).unwrap();
        assert!(bs.is_being_deleted());
    }

    #[test]
    fn test_secret_ref_namespace_fallback() {
        let mut secret_ref = SecretRef {
            name: "conn".to_string(),
            namespace: None,
        };
        assert_eq!(secret_ref.namespace_or("my-app"), "my-app");

        secret_ref.namespace = Some(String::new());
        assert_eq!(secret_ref.namespace_or("my-app"), "my-app");

        secret_ref.namespace = Some("shared".to_string());
        assert_eq!(secret_ref.namespace_or("my-app"), "shared");
    }

    #[test]
    fn test_instance_key_display() {
        let key = InstanceKey::from_instance(&sample());
        assert_eq!(key, InstanceKey::new("my-app", "backups"));
        assert_eq!(key.to_string(), "my-app/backups");
    }

    #[test]
    fn test_crd_metadata() {
        let crd = BlobStorage::crd();
        assert_eq!(crd.spec.group, "integreatly.org");
        assert_eq!(crd.spec.names.kind, "BlobStorage");
        assert_eq!(
            crd.spec.names.short_names,
            Some(vec!["bs".to_string()])
        );
    }
}
