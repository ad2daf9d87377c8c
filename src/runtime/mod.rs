//! # Runtime Module
//!
//! Process wiring for the BlobStorage controller: initialization, the watch
//! loop and the error policy applied to failed passes.

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

pub use error_policy::*;
pub use initialization::*;
pub use watch_loop::*;
