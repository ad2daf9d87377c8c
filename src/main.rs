//! # BlobStorage Controller
//!
//! Controller binary. See the library documentation for an overview.

use anyhow::Result;
use blobstorage_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;

    run_watch_loop(
        init_result.client,
        init_result.config.watch_namespace.as_deref(),
        init_result.reconciler,
        init_result.shutdown,
    )
    .await;

    init_result.server_state.set_ready(false);
    Ok(())
}
