//! # Initialization
//!
//! Controller start-up: rustls, logging, metrics, the HTTP server, the
//! Kubernetes client and the reconciler with its collaborators.

use crate::config::{load_config, ControllerConfig, ServerConfig};
use crate::controller::reconciler::{Reconciler, ShutdownSignal, ShutdownTrigger};
use crate::controller::secret::KubeSecretProjector;
use crate::controller::server::{start_server, ServerState};
use crate::controller::store::KubeInstanceStore;
use crate::controller::strategy::ConfigMapStrategyResolver;
use crate::observability::logging::init_logging;
use crate::observability::metrics::Metrics;
use crate::provider::{OpenShiftBlobStorageProvider, ProviderRegistry};
use anyhow::{anyhow, Context, Result};
use kube::Client;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    pub config: ControllerConfig,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    /// Fires the shutdown signal shared by every pass
    pub shutdown: ShutdownTrigger,
}

/// Initialize the controller runtime
///
/// # Errors
///
/// Fails when the crypto provider, metrics, HTTP server or Kubernetes client
/// cannot be set up.
pub async fn initialize() -> Result<InitializationResult> {
    // must run before anything opens a TLS connection
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|existing| {
            anyhow!("Failed to install rustls crypto provider, one is already installed: {existing:?}")
        })?;

    init_logging();
    info!("Starting BlobStorage controller v{}", env!("CARGO_PKG_VERSION"));

    let (config, server_config) = load_config();
    info!(
        "Configuration: strategy config map {}, provider interval {}s, watch namespace {}",
        config.strategy_config_map_name,
        config.provider_reconcile_interval.as_secs(),
        config.watch_namespace.as_deref().unwrap_or("<all>")
    );

    let metrics = Arc::new(Metrics::new()?);
    let server_state = Arc::new(ServerState::new(metrics.clone()));

    let server_state_clone = server_state.clone();
    let port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let (shutdown, signal) = ShutdownSignal::channel();
    let reconciler = Arc::new(build_reconciler(client.clone(), &config, metrics, signal));
    info!("Registered providers: {:?}", reconciler.providers().names());

    Ok(InitializationResult {
        client,
        config,
        reconciler,
        server_state,
        shutdown,
    })
}

/// Providers available to this controller, in selection order
pub fn default_providers(client: Client, config: &ControllerConfig) -> ProviderRegistry {
    ProviderRegistry::new().with_provider(Arc::new(OpenShiftBlobStorageProvider::new(
        client,
        config.provider_reconcile_interval,
    )))
}

/// Reconciler wired to the Kubernetes-backed collaborators
pub fn build_reconciler(
    client: Client,
    config: &ControllerConfig,
    metrics: Arc<Metrics>,
    shutdown: ShutdownSignal,
) -> Reconciler {
    Reconciler::new(
        Arc::new(KubeInstanceStore::new(client.clone())),
        Arc::new(ConfigMapStrategyResolver::new(
            client.clone(),
            config.strategy_config_map_name.clone(),
            config.strategy_config_map_namespace.clone(),
        )),
        default_providers(client.clone(), config),
        Arc::new(KubeSecretProjector::new(client)),
        metrics,
    )
    .with_shutdown(shutdown)
    .with_error_backoff(config.error_backoff_min_secs, config.error_backoff_max_secs)
}

async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let start_time = Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow!("HTTP server failed to start"));
        }
        if server_state.ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }
        if start_time.elapsed() > startup_timeout {
            return Err(anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }
        tokio::time::sleep(server_config.poll_interval()).await;
    }
}
