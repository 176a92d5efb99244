//! Restore Pass - Deep copy of subtrees preserved during reconciliation
//!
//! The reconciler only creates the top directory of a one-sided subtree and
//! leaves the rest of it untouched in the forest that holds the data. Once
//! every directory identifier of the main pass is known, this pass walks
//! those untouched nodes shallow to deep and copies them across.

use super::policy::{Decider, ObjectKind};
use crate::executor::Executor;
use crate::types::{depth_of, Forest, Side, SyncError, TreeNode};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

/// A subtree to copy onto the side that lacks it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreTarget {
    /// Top directory of the subtree (already created on the missing side)
    pub path: Utf8PathBuf,
    /// Side that lacks the subtree
    pub missing: Side,
}

/// Copies deferred subtrees once the main pass is done
pub struct RestorePass<'r, 'a> {
    executor: &'r mut Executor<'a>,
    decider: Option<&'r mut dyn Decider>,
}

impl<'r, 'a> RestorePass<'r, 'a> {
    pub fn new(executor: &'r mut Executor<'a>) -> Self {
        Self {
            executor,
            decider: None,
        }
    }

    /// Confirm every copied object with `decider`
    pub fn with_decider(mut self, decider: &'r mut dyn Decider) -> Self {
        self.decider = Some(decider);
        self
    }

    /// Restore every target, consuming the source nodes it copies
    pub fn run(
        mut self,
        targets: &[RestoreTarget],
        local: &mut Forest,
        remote: &mut Forest,
    ) -> Result<(), SyncError> {
        for missing in [Side::Remote, Side::Local] {
            let roots: Vec<&Utf8Path> = targets
                .iter()
                .filter(|target| target.missing == missing)
                .map(|target| target.path.as_path())
                .collect();
            if roots.is_empty() {
                continue;
            }

            let source: &Forest = match missing {
                Side::Remote => &*local,
                Side::Local => &*remote,
            };
            let mut paths: Vec<Utf8PathBuf> = source
                .iter()
                .map(|node| node.relative_path.clone())
                .filter(|path| roots.iter().any(|root| path.starts_with(root)))
                .collect();
            paths.sort_by(|a, b| depth_of(a).cmp(&depth_of(b)).then_with(|| a.cmp(b)));
            debug!("Restoring {} directories onto the {:?} side", paths.len(), missing);

            let mut declined: Vec<Utf8PathBuf> = Vec::new();
            for path in paths {
                if declined.iter().any(|skipped| path.starts_with(skipped)) {
                    continue;
                }
                match missing {
                    Side::Remote => self.restore_to_remote(&path, local, remote, &mut declined)?,
                    Side::Local => self.restore_to_local(&path, local, remote, &mut declined)?,
                }
            }
        }
        Ok(())
    }

    fn restore_to_remote(
        &mut self,
        path: &Utf8Path,
        local: &mut Forest,
        remote: &mut Forest,
        declined: &mut Vec<Utf8PathBuf>,
    ) -> Result<(), SyncError> {
        let Some(node) = local.remove(path) else {
            return Ok(());
        };
        let Some(folder_id) = remote.get(path).and_then(|n| n.folder_id.clone()) else {
            warn!("No remote folder registered for {}, restore skipped", path);
            return Ok(());
        };

        for (name, file) in &node.files {
            let file_path = node.child_path(name);
            if self.confirm(&file_path, ObjectKind::File)? {
                self.executor.upload(&file_path, &folder_id, file.mtime)?;
            }
        }

        for name in node.dirs.keys() {
            let dir_path = node.child_path(name);
            if !self.confirm(&dir_path, ObjectKind::Dir)? {
                declined.push(dir_path);
                continue;
            }
            let id = self.executor.create_remote_dir(&dir_path, &folder_id)?;
            remote.insert(TreeNode::remote(dir_path, id));
        }
        Ok(())
    }

    fn restore_to_local(
        &mut self,
        path: &Utf8Path,
        local: &mut Forest,
        remote: &mut Forest,
        declined: &mut Vec<Utf8PathBuf>,
    ) -> Result<(), SyncError> {
        let Some(node) = remote.remove(path) else {
            return Ok(());
        };

        for (name, file) in &node.files {
            let file_path = node.child_path(name);
            if !self.confirm(&file_path, ObjectKind::File)? {
                continue;
            }
            let id = file.remote_id.clone().ok_or_else(|| {
                SyncError::Validation(format!("Remote entry {} has no identifier", file_path))
            })?;
            self.executor.download(&file_path, &id, file.mtime)?;
        }

        for name in node.dirs.keys() {
            let dir_path = node.child_path(name);
            if !self.confirm(&dir_path, ObjectKind::Dir)? {
                declined.push(dir_path);
                continue;
            }
            self.executor.create_local_dir(&dir_path)?;
            local.insert(TreeNode::local(dir_path));
        }
        Ok(())
    }

    fn confirm(&mut self, path: &Utf8Path, kind: ObjectKind) -> Result<bool, SyncError> {
        match self.decider.as_deref_mut() {
            Some(decider) => decider.confirm_restore(path, kind),
            None => Ok(true),
        }
    }
}
