//! # BSCTL CLI
//!
//! Command-line interface for the BlobStorage controller.
//!
//! ## Usage
//!
//! ```bash
//! # Trigger reconciliation for a specific BlobStorage
//! bsctl reconcile --namespace default --name my-bucket
//!
//! # List all BlobStorage resources
//! bsctl list
//!
//! # Show status of a BlobStorage
//! bsctl status --namespace default --name my-bucket
//! ```

use anyhow::{Context, Result};
use blobstorage_controller::constants::RECONCILE_ANNOTATION;
use blobstorage_controller::crd::BlobStorage;
use clap::{Parser, Subcommand};
use kube::{
    api::{Api, ListParams, Patch, PatchParams},
    Client,
};
use serde_json::json;

/// BlobStorage controller CLI
#[derive(Parser)]
#[command(name = "bsctl")]
#[command(about = "BlobStorage controller CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Trigger reconciliation for a BlobStorage resource
    Reconcile {
        /// Name of the BlobStorage resource
        #[arg(long)]
        name: String,
    },
    /// List BlobStorage resources (all namespaces unless --namespace is set)
    List,
    /// Show status of a BlobStorage resource
    Status {
        /// Name of the BlobStorage resource
        #[arg(long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bsctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::Reconcile { name } => reconcile_command(client, name, cli.namespace).await,
        Commands::List => list_command(client, cli.namespace).await,
        Commands::Status { name } => status_command(client, name, cli.namespace).await,
    }
}

/// Stamp the reconcile annotation; the change wakes the controller's watch
async fn reconcile_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    println!("Triggering reconciliation for BlobStorage '{}/{}'...", ns, name);

    let api: Api<BlobStorage> = Api::namespaced(client, ns);
    let timestamp = chrono::Utc::now().to_rfc3339();
    let patch = json!({
        "metadata": {
            "annotations": {
                RECONCILE_ANNOTATION: timestamp
            }
        }
    });

    api.patch(&name, &PatchParams::default(), &Patch::Merge(&patch))
        .await
        .with_context(|| format!("Failed to trigger reconciliation for '{}/{}'", ns, name))?;

    println!("Reconciliation triggered");
    println!("   Resource: {}/{}", ns, name);
    println!("   Timestamp: {}", timestamp);
    Ok(())
}

async fn list_command(client: Client, namespace: Option<String>) -> Result<()> {
    let api: Api<BlobStorage> = match namespace.as_deref() {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    };

    let instances = api
        .list(&ListParams::default())
        .await
        .context("Failed to list BlobStorage resources")?;

    if instances.items.is_empty() {
        println!("No BlobStorage resources found.");
        return Ok(());
    }

    println!(
        "{:<30} {:<20} {:<20} {:<12} {:<25}",
        "NAME", "NAMESPACE", "PHASE", "STRATEGY", "PROVIDER"
    );
    println!("{}", "-".repeat(110));

    for instance in &instances.items {
        let status = instance.status.as_ref();
        println!(
            "{:<30} {:<20} {:<20} {:<12} {:<25}",
            instance.metadata.name.as_deref().unwrap_or("<unknown>"),
            instance.metadata.namespace.as_deref().unwrap_or("<unknown>"),
            instance.phase().as_str(),
            status.and_then(|s| s.strategy.as_deref()).unwrap_or("-"),
            status.and_then(|s| s.provider.as_deref()).unwrap_or("-"),
        );
    }

    Ok(())
}

async fn status_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");
    let api: Api<BlobStorage> = Api::namespaced(client, ns);

    let instance = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get BlobStorage '{}/{}'", ns, name))?;

    println!("Status for BlobStorage '{}/{}':\n", ns, name);
    println!("Spec:");
    println!("  Type: {}", instance.spec.deployment_type);
    if let Some(ref tier) = instance.spec.tier {
        println!("  Tier: {}", tier);
    }
    if let Some(ref secret_ref) = instance.spec.secret_ref {
        println!("  Secret: {}/{}", secret_ref.namespace_or(ns), secret_ref.name);
    }
    if instance.metadata.deletion_timestamp.is_some() {
        println!("  Marked for deletion");
    }

    match instance.status {
        Some(ref status) => {
            println!("\nStatus:");
            println!("  Phase: {}", status.phase);
            if !status.message.is_empty() {
                println!("  Message: {}", status.message);
            }
            if let Some(ref strategy) = status.strategy {
                println!("  Strategy: {}", strategy);
            }
            if let Some(ref provider) = status.provider {
                println!("  Provider: {}", provider);
            }
            if let Some(ref secret_ref) = status.secret_ref {
                println!("  Secret: {}/{}", secret_ref.namespace_or(ns), secret_ref.name);
            }
            if let Some(generation) = status.observed_generation {
                println!("  Observed Generation: {}", generation);
            }
        }
        None => {
            println!("\nStatus: No status available (resource may not have been reconciled yet)");
        }
    }

    Ok(())
}
