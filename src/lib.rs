//! memory-sync - incremental code summarization
//!
//! Watches a TypeScript/JavaScript source tree, summarizes each file
//! (exports, signatures, comments) and pushes the summaries to a memory
//! service in debounced batches.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;
pub mod extract;
pub mod logging;
pub mod pipeline;
pub mod proxy;
pub mod types;
pub mod watch;

pub use error::{Result, SyncError};
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
