//! Tree Builder - Per-directory snapshots of both sides

mod local;
mod remote;

pub use local::build_local_forest;
pub use remote::build_remote_forest;

/// Callback for reporting scan progress
///
/// Arguments:
/// - `dirs_scanned`: Number of directories listed so far
/// - `files_seen`: Number of files recorded so far
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;
