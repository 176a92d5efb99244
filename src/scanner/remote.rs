//! Remote forest builder (paginated breadth-first listing)

use super::ProgressCallback;
use crate::store::{RemoteKind, RemoteStore};
use crate::types::{DirEntry, FileEntry, Forest, SyncError, TreeNode};
use camino::Utf8PathBuf;
use std::collections::VecDeque;
use tracing::{debug, warn};

/// Build the remote forest below the folder `root_id`
///
/// Each node records its own folder identifier so later writes can place
/// children without resolving the path again. When a folder holds several
/// objects of the same kind and name, the first one listed wins and the rest
/// are reported as anomalies.
pub fn build_remote_forest(
    remote: &mut dyn RemoteStore,
    root_id: &str,
    page_size: usize,
    on_progress: Option<&ProgressCallback>,
) -> Result<Forest, SyncError> {
    let mut forest = Forest::new();
    let mut pending: VecDeque<(Utf8PathBuf, String)> =
        VecDeque::from([(Utf8PathBuf::new(), root_id.to_string())]);
    let mut dirs_scanned: u64 = 0;
    let mut files_seen: u64 = 0;

    while let Some((dir, folder_id)) = pending.pop_front() {
        let mut node = TreeNode::remote(dir.clone(), folder_id.clone());
        let mut page_token: Option<String> = None;

        loop {
            let page = remote.list_children(&folder_id, page_token.as_deref(), page_size)?;
            for item in page.items {
                match item.kind {
                    RemoteKind::Folder => {
                        let child_path = dir.join(&item.name);
                        if node.add_dir(DirEntry::remote(item.name.clone(), item.id.clone())) {
                            pending.push_back((child_path, item.id));
                        } else {
                            warn!(
                                "Duplicate remote folder {} (id {}); using the first match",
                                child_path, item.id
                            );
                        }
                    }
                    RemoteKind::File => {
                        let name = item.name.clone();
                        if node.add_file(FileEntry::remote(item.name, item.id.clone(), item.mtime)) {
                            files_seen += 1;
                        } else {
                            warn!(
                                "Duplicate remote file {} (id {}); using the first match",
                                dir.join(&name),
                                item.id
                            );
                        }
                    }
                }
            }

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        forest.insert(node);
        dirs_scanned += 1;
        if let Some(callback) = on_progress {
            callback(dirs_scanned, files_seen);
        }
    }

    debug!(
        "Remote scan: {} folders, {} files",
        dirs_scanned, files_seen
    );
    Ok(forest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRemote;
    use camino::Utf8Path;

    #[test]
    fn test_remote_forest_records_folder_ids() {
        let mut remote = MemoryRemote::new();
        let a = remote.put_folder("a").unwrap();
        let b = remote.put_folder("a/b").unwrap();
        remote.put_file("a/b/f.txt", b"x", 50).unwrap();

        let forest = build_remote_forest(&mut remote, "root", 1000, None).unwrap();

        assert_eq!(forest.len(), 3);
        assert_eq!(
            forest.get(Utf8Path::new("a")).unwrap().folder_id.as_deref(),
            Some(a.as_str())
        );
        let node_b = forest.get(&Utf8Path::new("a").join("b")).unwrap();
        assert_eq!(node_b.folder_id.as_deref(), Some(b.as_str()));
        assert_eq!(node_b.files["f.txt"].mtime, 50);
        assert!(node_b.files["f.txt"].remote_id.is_some());
    }

    #[test]
    fn test_remote_forest_follows_pages() {
        let mut remote = MemoryRemote::new();
        for i in 0..7 {
            remote.put_file(&format!("f{}.txt", i), b"", 1).unwrap();
        }
        remote.put_folder("zz").unwrap();

        let forest = build_remote_forest(&mut remote, "root", 3, None).unwrap();

        let root = forest.get(Utf8Path::new("")).unwrap();
        assert_eq!(root.files.len(), 7);
        assert!(root.dirs.contains_key("zz"));
    }

    #[test]
    fn test_duplicate_names_keep_first() {
        let mut remote = MemoryRemote::new();
        let first = remote.upload_file("dup.txt", "root", b"1", 1).unwrap();
        remote.upload_file("dup.txt", "root", b"2", 2).unwrap();

        let forest = build_remote_forest(&mut remote, "root", 1000, None).unwrap();

        let root = forest.get(Utf8Path::new("")).unwrap();
        assert_eq!(root.files.len(), 1);
        assert_eq!(root.files["dup.txt"].remote_id.as_deref(), Some(first.as_str()));
    }

    #[test]
    fn test_subfolder_root() {
        let mut remote = MemoryRemote::new();
        let base = remote.put_folder("sync/base").unwrap();
        remote.put_file("sync/base/in.txt", b"", 1).unwrap();
        remote.put_file("sync/out.txt", b"", 1).unwrap();

        let forest = build_remote_forest(&mut remote, &base, 1000, None).unwrap();

        assert_eq!(forest.len(), 1);
        assert!(forest.get(Utf8Path::new("")).unwrap().files.contains_key("in.txt"));
    }
}
