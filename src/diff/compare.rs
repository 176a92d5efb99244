//! File comparison logic

use crate::types::FileEntry;
use std::cmp::Ordering;

/// Which copy of a matched file pair wins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    /// Local copy is strictly newer → overwrite remote
    LocalNewer,
    /// Remote copy is strictly newer → overwrite local
    RemoteNewer,
    /// Same modification time → nothing to do
    Same,
}

/// Compare a local/remote file pair by modification time
///
/// Timestamps are whole seconds on both sides, so equal values mean the
/// copies are treated as identical. Content is never inspected. The rule is
/// the same for every sync direction.
pub fn compare_files(local: &FileEntry, remote: &FileEntry) -> Recency {
    match local.mtime.cmp(&remote.mtime) {
        Ordering::Greater => Recency::LocalNewer,
        Ordering::Less => Recency::RemoteNewer,
        Ordering::Equal => Recency::Same,
    }
}
