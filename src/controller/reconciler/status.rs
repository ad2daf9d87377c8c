//! # Status Transitions
//!
//! Builds the next status for each pass outcome. Fields not named by a
//! transition carry over from the current status, so a failure never erases
//! the strategy or provider recorded by an earlier success.

use crate::crd::{BlobStorage, BlobStorageStatus, StatusMessage, StatusPhase};

/// Current status with a new phase and message
pub(crate) fn transition(
    instance: &BlobStorage,
    phase: StatusPhase,
    message: StatusMessage,
) -> BlobStorageStatus {
    let mut status = instance.status.clone().unwrap_or_default();
    status.phase = phase;
    status.message = message;
    status.observed_generation = instance.metadata.generation;
    status
}

/// Terminal failure before any provider was called; secret ref is kept
pub(crate) fn failed(instance: &BlobStorage, message: StatusMessage) -> BlobStorageStatus {
    transition(instance, StatusPhase::Failed, message)
}

/// Provider creation failed; the secret can no longer be trusted
pub(crate) fn create_failed(instance: &BlobStorage, message: StatusMessage) -> BlobStorageStatus {
    let mut status = failed(instance, message);
    status.secret_ref = None;
    status
}

pub(crate) fn in_progress(instance: &BlobStorage, message: StatusMessage) -> BlobStorageStatus {
    let mut status = transition(instance, StatusPhase::InProgress, message);
    status.secret_ref = None;
    status
}

pub(crate) fn deleting(instance: &BlobStorage, message: StatusMessage) -> BlobStorageStatus {
    transition(instance, StatusPhase::DeleteInProgress, message)
}

/// Storage is ready and its connection details were projected
pub(crate) fn complete(
    instance: &BlobStorage,
    message: StatusMessage,
    strategy: &str,
    provider: &str,
) -> BlobStorageStatus {
    let mut status = transition(instance, StatusPhase::Complete, message);
    status.strategy = Some(strategy.to_string());
    status.provider = Some(provider.to_string());
    status.secret_ref = instance.spec.secret_ref.clone();
    status
}

/// Whether writing `next` would change anything
pub(crate) fn is_unchanged(instance: &BlobStorage, next: &BlobStorageStatus) -> bool {
    instance.status.as_ref() == Some(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{BlobStorageSpec, SecretRef};

    fn instance_with_status(status: Option<BlobStorageStatus>) -> BlobStorage {
        let mut instance = BlobStorage::new(
            "bs",
            BlobStorageSpec {
                deployment_type: "workshop".to_string(),
                tier: None,
                secret_ref: Some(SecretRef {
                    name: "bs-sec".to_string(),
                    namespace: None,
                }),
            },
        );
        instance.metadata.namespace = Some("ns".to_string());
        instance.metadata.generation = Some(3);
        instance.status = status;
        instance
    }

    fn completed() -> BlobStorageStatus {
        BlobStorageStatus {
            phase: StatusPhase::Complete,
            message: StatusMessage::new("creation successful"),
            strategy: Some("openshift".to_string()),
            provider: Some("openshift-blobstorage".to_string()),
            secret_ref: Some(SecretRef {
                name: "bs-sec".to_string(),
                namespace: None,
            }),
            observed_generation: Some(3),
        }
    }

    #[test]
    fn test_complete_records_spec_secret_ref() {
        let instance = instance_with_status(None);
        let status = complete(
            &instance,
            StatusMessage::new("creation successful"),
            "openshift",
            "openshift-blobstorage",
        );
        assert_eq!(status, completed());
    }

    #[test]
    fn test_failed_keeps_secret_ref_and_strategy() {
        let instance = instance_with_status(Some(completed()));
        let status = failed(&instance, StatusMessage::new("deployment configuration not found"));
        assert_eq!(status.phase, StatusPhase::Failed);
        assert!(status.secret_ref.is_some());
        assert_eq!(status.strategy.as_deref(), Some("openshift"));
    }

    #[test]
    fn test_create_failed_and_in_progress_clear_secret_ref() {
        let instance = instance_with_status(Some(completed()));
        assert!(create_failed(&instance, StatusMessage::new("boom")).secret_ref.is_none());
        let converging = in_progress(&instance, StatusMessage::new("creating bucket"));
        assert_eq!(converging.phase, StatusPhase::InProgress);
        assert!(converging.secret_ref.is_none());
    }

    #[test]
    fn test_deleting_keeps_other_fields() {
        let instance = instance_with_status(Some(completed()));
        let status = deleting(&instance, StatusMessage::new("deletion successful"));
        assert_eq!(status.phase, StatusPhase::DeleteInProgress);
        assert_eq!(status.provider.as_deref(), Some("openshift-blobstorage"));
        assert!(status.secret_ref.is_some());
    }

    #[test]
    fn test_is_unchanged() {
        let instance = instance_with_status(Some(completed()));
        assert!(is_unchanged(&instance, &completed()));

        let fresh = instance_with_status(None);
        assert!(!is_unchanged(&fresh, &completed()));
    }
}
