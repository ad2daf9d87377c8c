//! # CRD Generator
//!
//! Prints the BlobStorage CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/blobstorage.yaml
//! ```

use blobstorage_controller::crd::BlobStorage;
use kube::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&BlobStorage::crd())?);
    Ok(())
}
