//! # Test Fixtures
//!
//! In-memory collaborators for driving reconciliation passes without a
//! cluster.

#![allow(dead_code)]

use async_trait::async_trait;
use blobstorage_controller::constants::BLOB_STORAGE_FINALIZER;
use blobstorage_controller::controller::reconciler::Reconciler;
use blobstorage_controller::controller::secret::{ProjectionError, SecretProjector};
use blobstorage_controller::controller::store::{InstanceStore, StoreError};
use blobstorage_controller::controller::strategy::{StrategyError, StrategyResolver};
use blobstorage_controller::crd::{
    BlobStorage, BlobStorageStatus, InstanceKey, SecretRef, StatusMessage,
};
use blobstorage_controller::observability::metrics::Metrics;
use blobstorage_controller::provider::{
    BlobStorageDeploymentDetails, BlobStorageInstance, BlobStorageProvider, CreateOutcome,
    ProviderError, ProviderRegistry,
};
use kube::ResourceExt;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NAMESPACE: &str = "test-ns";
pub const NAME: &str = "test-bs";

pub fn key() -> InstanceKey {
    InstanceKey::new(NAMESPACE, NAME)
}

/// Instance with a secretRef named `<name>-sec`
pub fn blob_storage(deployment_type: &str) -> BlobStorage {
    serde_json::from_value(json!({
        "apiVersion": "integreatly.org/v1alpha1",
        "kind": "BlobStorage",
        "metadata": {
            "name": NAME,
            "namespace": NAMESPACE,
            "generation": 1,
            "resourceVersion": "1",
        },
        "spec": {
            "type": deployment_type,
            "tier": "development",
            "secretRef": { "name": format!("{NAME}-sec") },
        },
    }))
    .unwrap()
}

pub fn blob_storage_without_secret_ref(deployment_type: &str) -> BlobStorage {
    let mut instance = blob_storage(deployment_type);
    instance.spec.secret_ref = None;
    instance
}

/// Instance an external actor has asked to delete
pub fn deleting_blob_storage(deployment_type: &str) -> BlobStorage {
    serde_json::from_value(json!({
        "apiVersion": "integreatly.org/v1alpha1",
        "kind": "BlobStorage",
        "metadata": {
            "name": NAME,
            "namespace": NAMESPACE,
            "generation": 2,
            "resourceVersion": "7",
            "deletionTimestamp": "2024-05-01T12:00:00Z",
            "finalizers": ["finalizers.cloud-resources-operator.integreatly.org"],
        },
        "spec": {
            "type": deployment_type,
            "secretRef": { "name": format!("{NAME}-sec") },
        },
    }))
    .unwrap()
}

pub fn details() -> BlobStorageDeploymentDetails {
    BlobStorageDeploymentDetails {
        bucket_name: "test-bucket".to_string(),
        bucket_region: "eu-west-1".to_string(),
        credential_key_id: "AKIATEST".to_string(),
        credential_secret_key: "s3cr3t".to_string(),
    }
}

/// Failure injected into the next status write
#[derive(Debug, Clone, Copy)]
pub enum WriteFailure {
    Conflict,
    NotFound,
}

/// Instance store over a map, recording every successful status write
#[derive(Default)]
pub struct FakeStore {
    instances: Mutex<HashMap<InstanceKey, BlobStorage>>,
    writes: Mutex<Vec<BlobStorageStatus>>,
    next_write_failure: Mutex<Option<WriteFailure>>,
    gets: AtomicUsize,
}

impl FakeStore {
    pub fn with(instance: BlobStorage) -> Arc<Self> {
        let store = Self::default();
        store.insert(instance);
        Arc::new(store)
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert(&self, instance: BlobStorage) {
        let key = InstanceKey::from_instance(&instance);
        self.instances.lock().unwrap().insert(key, instance);
    }

    pub fn remove(&self, key: &InstanceKey) {
        self.instances.lock().unwrap().remove(key);
    }

    pub fn instance(&self, key: &InstanceKey) -> Option<BlobStorage> {
        self.instances.lock().unwrap().get(key).cloned()
    }

    pub fn status(&self) -> Option<BlobStorageStatus> {
        self.instance(&key()).and_then(|i| i.status)
    }

    pub fn writes(&self) -> Vec<BlobStorageStatus> {
        self.writes.lock().unwrap().clone()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn fail_next_write(&self, failure: WriteFailure) {
        *self.next_write_failure.lock().unwrap() = Some(failure);
    }

    /// Apply a metadata write to the stored object the way the API server
    /// does: bump its `resourceVersion`, and remove it once it is being
    /// deleted with no finalizers left. Returns the stored object.
    pub fn write_metadata(
        &self,
        key: &InstanceKey,
        update: impl FnOnce(&mut BlobStorage),
    ) -> Option<BlobStorage> {
        let mut instances = self.instances.lock().unwrap();
        let stored = instances.get_mut(key)?;
        update(stored);
        bump_resource_version(stored);
        let updated = stored.clone();
        if updated.metadata.deletion_timestamp.is_some() && updated.finalizers().is_empty() {
            instances.remove(key);
        }
        Some(updated)
    }
}

fn bump_resource_version(instance: &mut BlobStorage) {
    let current: u64 = instance
        .resource_version()
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    instance.metadata.resource_version = Some((current + 1).to_string());
}

#[async_trait]
impl InstanceStore for FakeStore {
    async fn get(&self, key: &InstanceKey) -> Result<Option<BlobStorage>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.instance(key))
    }

    async fn update_status(
        &self,
        instance: &BlobStorage,
        status: BlobStorageStatus,
    ) -> Result<(), StoreError> {
        let key = InstanceKey::from_instance(instance);
        if let Some(failure) = self.next_write_failure.lock().unwrap().take() {
            return Err(match failure {
                WriteFailure::Conflict => StoreError::Conflict { key },
                WriteFailure::NotFound => StoreError::NotFound { key },
            });
        }

        let mut instances = self.instances.lock().unwrap();
        let Some(stored) = instances.get_mut(&key) else {
            return Err(StoreError::NotFound { key });
        };
        if stored.resource_version() != instance.resource_version() {
            return Err(StoreError::Conflict { key });
        }
        stored.status = Some(status.clone());
        bump_resource_version(stored);
        self.writes.lock().unwrap().push(status);
        Ok(())
    }
}

/// Strategy resolver over a fixed deployment type table
#[derive(Default)]
pub struct FakeResolver {
    strategies: HashMap<String, String>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub fn with(entries: &[(&str, &str)]) -> Arc<Self> {
        Arc::new(Self {
            strategies: entries
                .iter()
                .map(|(t, s)| ((*t).to_string(), (*s).to_string()))
                .collect(),
            unavailable: false,
            calls: AtomicUsize::new(0),
        })
    }

    /// Resolver whose config map read fails with a 503
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            unavailable: true,
            ..Self::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StrategyResolver for FakeResolver {
    async fn resolve(&self, _namespace: &str, deployment_type: &str) -> Result<String, StrategyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(StrategyError::Kube {
                namespace: NAMESPACE.to_string(),
                name: "cloud-resource-config".to_string(),
                source: kube::Error::Api(kube::error::ErrorResponse {
                    status: "Failure".to_string(),
                    message: "etcdserver: request timed out".to_string(),
                    reason: "ServiceUnavailable".to_string(),
                    code: 503,
                }),
            });
        }
        self.strategies
            .get(deployment_type)
            .cloned()
            .ok_or_else(|| StrategyError::NotDefined {
                deployment_type: deployment_type.to_string(),
            })
    }
}

type CreateFn = Box<dyn Fn() -> Result<CreateOutcome, ProviderError> + Send + Sync>;
type DeleteFn = Box<dyn Fn() -> Result<StatusMessage, ProviderError> + Send + Sync>;

/// Scripted provider counting its calls
pub struct FakeProvider {
    name: String,
    strategies: Vec<String>,
    interval: Duration,
    on_create: CreateFn,
    on_delete: DeleteFn,
    hang_on_create: bool,
    finalizer_store: Option<Arc<FakeStore>>,
    creates: AtomicUsize,
    deletes: AtomicUsize,
}

impl FakeProvider {
    /// Provider that is immediately ready with [`details`]
    pub fn new(name: &str, strategies: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            strategies: strategies.iter().map(|s| (*s).to_string()).collect(),
            interval: Duration::from_secs(30),
            on_create: Box::new(|| {
                Ok(CreateOutcome::Ready {
                    instance: BlobStorageInstance {
                        deployment_details: details(),
                    },
                    message: StatusMessage::new("creation successful"),
                })
            }),
            on_delete: Box::new(|| Ok(StatusMessage::new("deletion in progress"))),
            hang_on_create: false,
            finalizer_store: None,
            creates: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn on_create(
        mut self,
        f: impl Fn() -> Result<CreateOutcome, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.on_create = Box::new(f);
        self
    }

    pub fn on_delete(
        mut self,
        f: impl Fn() -> Result<StatusMessage, ProviderError> + Send + Sync + 'static,
    ) -> Self {
        self.on_delete = Box::new(f);
        self
    }

    /// Create never returns
    pub fn hanging(mut self) -> Self {
        self.hang_on_create = true;
        self
    }

    /// Add a finalizer on create and drop it on delete through `store`,
    /// handing the written metadata back like a real provider
    pub fn writing_finalizer(mut self, store: Arc<FakeStore>) -> Self {
        self.finalizer_store = Some(store);
        self
    }

    fn write_finalizer(&self, instance: &mut BlobStorage, present: bool) {
        let Some(store) = &self.finalizer_store else {
            return;
        };
        let key = InstanceKey::from_instance(instance);
        let updated = store.write_metadata(&key, |stored| {
            let finalizers = stored.metadata.finalizers.get_or_insert_with(Vec::new);
            finalizers.retain(|f| f != BLOB_STORAGE_FINALIZER);
            if present {
                finalizers.push(BLOB_STORAGE_FINALIZER.to_string());
            }
        });
        if let Some(updated) = updated {
            instance.metadata = updated.metadata;
        }
    }

    pub fn creates(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStorageProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn supports_strategy(&self, strategy: &str) -> bool {
        self.strategies.iter().any(|s| s == strategy)
    }

    fn reconcile_interval(&self, _instance: &BlobStorage) -> Duration {
        self.interval
    }

    async fn create_storage(
        &self,
        instance: &mut BlobStorage,
    ) -> Result<CreateOutcome, ProviderError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.hang_on_create {
            std::future::pending::<()>().await;
        }
        self.write_finalizer(instance, true);
        (self.on_create)()
    }

    async fn delete_storage(
        &self,
        instance: &mut BlobStorage,
    ) -> Result<StatusMessage, ProviderError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.write_finalizer(instance, false);
        (self.on_delete)()
    }
}

/// Secret projector recording what it was asked to write
#[derive(Default)]
pub struct FakeProjector {
    upserts: Mutex<Vec<(SecretRef, BTreeMap<String, Vec<u8>>)>>,
    fail: bool,
}

impl FakeProjector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            upserts: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn upserts(&self) -> Vec<(SecretRef, BTreeMap<String, Vec<u8>>)> {
        self.upserts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretProjector for FakeProjector {
    async fn upsert(
        &self,
        owner: &BlobStorage,
        secret_ref: &SecretRef,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), ProjectionError> {
        if self.fail {
            let namespace = owner.metadata.namespace.clone().unwrap_or_default();
            return Err(ProjectionError::Rejected {
                namespace: secret_ref.namespace_or(&namespace).to_string(),
                name: secret_ref.name.clone(),
                reason: "injected failure".to_string(),
            });
        }
        self.upserts
            .lock()
            .unwrap()
            .push((secret_ref.clone(), data));
        Ok(())
    }
}

/// Collaborators for one test, kept so assertions can inspect them
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub resolver: Arc<FakeResolver>,
    pub projector: Arc<FakeProjector>,
    pub reconciler: Arc<Reconciler>,
}

impl Harness {
    pub fn new(
        store: Arc<FakeStore>,
        resolver: Arc<FakeResolver>,
        providers: Vec<Arc<FakeProvider>>,
        projector: Arc<FakeProjector>,
    ) -> Self {
        let mut registry = ProviderRegistry::new();
        for provider in providers {
            registry.register(provider);
        }
        let reconciler = Reconciler::new(
            store.clone(),
            resolver.clone(),
            registry,
            projector.clone(),
            Arc::new(Metrics::new().unwrap()),
        );
        Self {
            store,
            resolver,
            projector,
            reconciler: Arc::new(reconciler),
        }
    }
}
