//! Local forest builder (breadth-first over the local store)

use super::ProgressCallback;
use crate::store::{LocalKind, LocalStore};
use crate::types::{DirEntry, FileEntry, Forest, SyncError, TreeNode};
use camino::Utf8PathBuf;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, warn};

/// Build the local forest, one node per directory under the sync root
///
/// Symlinks never appear (the store excludes them). File modification times
/// are whole seconds so they compare cleanly against remote timestamps.
///
/// # Errors
/// * The sync root itself cannot be listed
/// * A directory listing fails for any reason other than having vanished mid-scan
pub fn build_local_forest(
    local: &dyn LocalStore,
    on_progress: Option<&ProgressCallback>,
) -> Result<Forest, SyncError> {
    let start_time = Instant::now();
    let mut forest = Forest::new();
    let mut pending: VecDeque<Utf8PathBuf> = VecDeque::from([Utf8PathBuf::new()]);
    let mut dirs_scanned: u64 = 0;
    let mut files_seen: u64 = 0;

    while let Some(dir) = pending.pop_front() {
        let children = match local.list_children(&dir) {
            Ok(children) => children,
            Err(SyncError::LocalNotFound { .. }) if !dir.as_str().is_empty() => {
                warn!("Directory {} disappeared during scan, skipping it", dir);
                continue;
            }
            Err(e) => return Err(e),
        };

        let mut node = TreeNode::local(dir.clone());
        for child in children {
            match child.kind {
                LocalKind::File { mtime } => {
                    node.add_file(FileEntry::local(child.name, mtime));
                    files_seen += 1;
                }
                LocalKind::Dir => {
                    pending.push_back(dir.join(&child.name));
                    node.add_dir(DirEntry::local(child.name));
                }
            }
        }
        forest.insert(node);

        dirs_scanned += 1;
        if let Some(callback) = on_progress {
            callback(dirs_scanned, files_seen);
        }
    }

    debug!(
        "Local scan: {} directories, {} files in {:?}",
        dirs_scanned,
        files_seen,
        start_time.elapsed()
    );
    Ok(forest)
}
