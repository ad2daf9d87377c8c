//! # Watch Loop
//!
//! Runs `kube_runtime::Controller` over BlobStorage instances and the
//! Secrets they own until the process is asked to stop.

use super::error_policy::handle_reconciliation_error;
use crate::controller::reconciler::{reconcile, Reconciler, ShutdownTrigger};
use crate::crd::BlobStorage;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{Api, Client};
use kube_runtime::{controller::Error as ControllerError, watcher, Controller};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Watch all namespaces, or only `namespace` when set
fn scoped_api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
    <K as kube::Resource>::DynamicType: Default,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}

/// Run the controller until SIGTERM or Ctrl-C
///
/// The OS signal fires `shutdown`, which both stops the controller stream and
/// cancels in-flight passes at their next collaborator call.
pub async fn run_watch_loop(
    client: Client,
    namespace: Option<&str>,
    reconciler: Arc<Reconciler>,
    shutdown: ShutdownTrigger,
) {
    info!(
        "Starting controller for BlobStorage resources (scope: {})",
        namespace.unwrap_or("cluster-wide")
    );

    let instances: Api<BlobStorage> = scoped_api(client.clone(), namespace);
    let secrets: Api<Secret> = scoped_api(client, namespace);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        wait_for_os_signal().await;
        info!("Received shutdown signal, stopping controller");
        shutdown.trigger();
        let _ = stop_tx.send(());
    });

    Controller::new(instances, watcher::Config::default())
        .owns(secrets, watcher::Config::default())
        .graceful_shutdown_on(async move {
            let _ = stop_rx.await;
        })
        .run(reconcile, handle_reconciliation_error, reconciler)
        .for_each(|result| async move {
            match result {
                Ok((obj, action)) => {
                    debug!("Reconciled {:?}: {:?}", obj, action);
                }
                Err(ControllerError::ReconcilerFailed(e, obj)) => {
                    debug!("Reconciliation of {:?} failed: {}", obj, e);
                }
                Err(e) => {
                    warn!("Controller error: {}", e);
                }
            }
        })
        .await;

    info!("Controller stopped");
}

async fn wait_for_os_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
