//! # drivesync - Local/remote folder reconciliation
//!
//! Keeps a local directory tree and a folder hierarchy in a remote object
//! store in agreement. Full runs scan both sides and reconcile them tier by
//! tier under a direction policy; partial runs replay an explicit batch of
//! changes without scanning.

// Module declarations
pub mod apply;
pub mod commands;
pub mod config;
pub mod diff;
pub mod executor;
pub mod filter;
pub mod logging;
pub mod resolve;
pub mod scanner;
pub mod store;
pub mod types;
pub mod ui;

// Re-export commonly used types
pub use config::Config;
pub use diff::SyncReport;
pub use store::{FsLocalStore, LocalStore, MemoryRemote, RemoteStore};
pub use types::{ActionBatch, Forest, IgnoreRule, SyncAction, SyncDirection, SyncError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
