//! # Controller
//!
//! BlobStorage reconciliation and the collaborators it drives.
//!
//! - `reconciler` - The per-instance control loop pass
//! - `strategy` - Deployment type to strategy lookup
//! - `store` - Instance reads and status writes
//! - `secret` - Connection detail projection into Secrets
//! - `backoff` - Retry delays for retryable failures
//! - `server` - Health probes and metrics endpoint

pub mod backoff;
pub mod reconciler;
pub mod secret;
pub mod server;
pub mod store;
pub mod strategy;
