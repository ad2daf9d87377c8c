//! # Constants
//!
//! Default values shared by configuration, runtime and providers.

/// Field manager used for server-side apply and status writes
pub const FIELD_MANAGER: &str = "blobstorage-controller";

/// Finalizer held by providers while backend storage still exists
pub const BLOB_STORAGE_FINALIZER: &str = "finalizers.cloud-resources-operator.integreatly.org";

/// Annotation stamped by `bsctl reconcile` to force a pass
pub const RECONCILE_ANNOTATION: &str = "integreatly.org/reconcile";

/// ConfigMap holding the deployment type to strategy mapping
pub const DEFAULT_STRATEGY_CONFIG_MAP_NAME: &str = "cloud-resource-config";

/// Data key inside a deployment type mapping that names the blob storage strategy
pub const BLOB_STORAGE_STRATEGY_KEY: &str = "blobstorage";

/// Re-check interval advertised by built-in providers (seconds)
pub const DEFAULT_PROVIDER_RECONCILE_INTERVAL_SECS: u64 = 30;

/// Minimum backoff after a retryable pass failure (seconds)
pub const DEFAULT_ERROR_BACKOFF_MIN_SECS: u64 = 30;

/// Maximum backoff after a retryable pass failure (seconds)
pub const DEFAULT_ERROR_BACKOFF_MAX_SECS: u64 = 300;

/// HTTP port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// How long to wait for the HTTP server to bind at start-up (seconds)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Poll interval while waiting for the HTTP server (milliseconds)
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "blobstorage_controller=info,kube=info";
