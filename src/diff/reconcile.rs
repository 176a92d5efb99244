//! Reconciler - Tier-ordered, policy-driven merge of both forests
//!
//! Nodes are visited depth 0, 1, 2, ... so that a directory always exists on
//! the target side before anything is placed into it. Matched nodes are
//! removed from both forests as they are processed; directories created on
//! the fly are registered into the forest that lacked them so the next tier
//! finds a partner.

use super::compare::{compare_files, Recency};
use super::policy::{defers_to_restore, policy_for, Absence, Decider, Decision, ObjectKind};
use super::restore::RestoreTarget;
use crate::executor::Executor;
use crate::types::{FileEntry, Forest, Side, SyncDirection, SyncError, TreeNode};
use camino::{Utf8Path, Utf8PathBuf};
use std::mem;
use tracing::{debug, warn};

/// Runs the main reconciliation pass
pub struct Reconciler<'r, 'a> {
    direction: SyncDirection,
    executor: &'r mut Executor<'a>,
    decider: Option<&'r mut dyn Decider>,
    restore_targets: Vec<RestoreTarget>,
}

impl<'r, 'a> Reconciler<'r, 'a> {
    pub fn new(direction: SyncDirection, executor: &'r mut Executor<'a>) -> Self {
        Self {
            direction,
            executor,
            decider: None,
            restore_targets: Vec::new(),
        }
    }

    /// Ask `decider` about absences the direction leaves open
    pub fn with_decider(mut self, decider: &'r mut dyn Decider) -> Self {
        self.decider = Some(decider);
        self
    }

    /// Reconcile both forests, consuming every processed node
    ///
    /// Returns the subtrees deferred to the restore pass.
    pub fn run(mut self, local: &mut Forest, remote: &mut Forest) -> Result<Vec<RestoreTarget>, SyncError> {
        if self.direction == SyncDirection::Interactive && self.decider.is_none() {
            return Err(SyncError::Config(
                "Interactive sync needs a decision prompt".to_string(),
            ));
        }

        // Snapshot the driving tiers: nodes registered during the pass are
        // reached through their parent, not through this listing.
        let tiers = match self.direction.driving_side() {
            Side::Local => local.tiers(),
            Side::Remote => remote.tiers(),
        };

        for (depth, paths) in tiers {
            debug!("Reconciling tier {} ({} directories)", depth, paths.len());
            for path in paths {
                if self.is_deferred(&path) {
                    debug!("{} is restored later, skipping", path);
                    continue;
                }

                match (local.remove(&path), remote.remove(&path)) {
                    (Some(local_node), Some(remote_node)) => {
                        self.reconcile_pair(local_node, remote_node, local, remote)?
                    }
                    (local_node, remote_node) => {
                        debug!("{} has no counterpart, skipping", path);
                        // Keep whichever side is left for the restore pass
                        if let Some(node) = local_node {
                            local.insert(node);
                        }
                        if let Some(node) = remote_node {
                            remote.insert(node);
                        }
                    }
                }
            }
        }

        Ok(self.restore_targets)
    }

    fn reconcile_pair(
        &mut self,
        mut local_node: TreeNode,
        mut remote_node: TreeNode,
        local: &mut Forest,
        remote: &mut Forest,
    ) -> Result<(), SyncError> {
        let folder_id = remote_node.folder_id.clone().ok_or_else(|| {
            SyncError::Validation(format!(
                "Remote node {} has no folder identifier",
                remote_node.relative_path
            ))
        })?;
        let mut remote_deletes: Vec<(Utf8PathBuf, String)> = Vec::new();
        skip_kind_mismatches(&mut local_node, &mut remote_node, local, remote);

        for (name, local_file) in mem::take(&mut local_node.files) {
            let path = local_node.child_path(&name);
            match remote_node.files.remove(&name) {
                Some(remote_file) => self.resolve_conflict(&path, &local_file, &remote_file)?,
                None => self.local_only_file(&path, &local_file, &folder_id)?,
            }
        }

        for (name, remote_file) in mem::take(&mut remote_node.files) {
            let path = remote_node.child_path(&name);
            self.remote_only_file(&path, &remote_file, &mut remote_deletes)?;
        }

        for name in mem::take(&mut local_node.dirs).into_keys() {
            if remote_node.dirs.remove(&name).is_some() {
                continue;
            }
            let path = local_node.child_path(&name);
            self.local_only_dir(&path, &folder_id, local, remote)?;
        }

        for (name, dir) in mem::take(&mut remote_node.dirs) {
            let path = remote_node.child_path(&name);
            let id = remote_id(&path, dir.remote_id)?;
            self.remote_only_dir(&path, id, local, remote, &mut remote_deletes)?;
        }

        self.executor.delete_remote_batch(&remote_deletes)
    }

    fn resolve_conflict(
        &mut self,
        path: &Utf8Path,
        local_file: &FileEntry,
        remote_file: &FileEntry,
    ) -> Result<(), SyncError> {
        let id = remote_id(path, remote_file.remote_id.clone())?;
        match compare_files(local_file, remote_file) {
            Recency::LocalNewer => self.executor.update_remote(path, &id, local_file.mtime),
            Recency::RemoteNewer => self.executor.download(path, &id, remote_file.mtime),
            Recency::Same => Ok(()),
        }
    }

    fn local_only_file(&mut self, path: &Utf8Path, file: &FileEntry, folder_id: &str) -> Result<(), SyncError> {
        match self.decide(path, ObjectKind::File, Side::Remote)? {
            Decision::Create => self.executor.upload(path, folder_id, file.mtime).map(|_| ()),
            Decision::Delete => self.executor.delete_local_file(path),
        }
    }

    fn remote_only_file(
        &mut self,
        path: &Utf8Path,
        file: &FileEntry,
        remote_deletes: &mut Vec<(Utf8PathBuf, String)>,
    ) -> Result<(), SyncError> {
        let id = remote_id(path, file.remote_id.clone())?;
        match self.decide(path, ObjectKind::File, Side::Local)? {
            Decision::Create => self.executor.download(path, &id, file.mtime),
            Decision::Delete => {
                remote_deletes.push((path.to_path_buf(), id));
                Ok(())
            }
        }
    }

    fn local_only_dir(
        &mut self,
        path: &Utf8Path,
        parent_id: &str,
        local: &mut Forest,
        remote: &mut Forest,
    ) -> Result<(), SyncError> {
        match self.decide(path, ObjectKind::Dir, Side::Remote)? {
            Decision::Create => {
                let id = self.executor.create_remote_dir(path, parent_id)?;
                remote.insert(TreeNode::remote(path, id));
                if defers_to_restore(self.direction) {
                    self.defer(path, Side::Remote);
                }
                Ok(())
            }
            Decision::Delete => {
                self.executor.delete_local_dir(path)?;
                local.remove_subtree(path);
                Ok(())
            }
        }
    }

    fn remote_only_dir(
        &mut self,
        path: &Utf8Path,
        id: String,
        local: &mut Forest,
        remote: &mut Forest,
        remote_deletes: &mut Vec<(Utf8PathBuf, String)>,
    ) -> Result<(), SyncError> {
        match self.decide(path, ObjectKind::Dir, Side::Local)? {
            Decision::Create => {
                self.executor.create_local_dir(path)?;
                if defers_to_restore(self.direction) {
                    self.defer(path, Side::Local);
                } else {
                    local.insert(TreeNode::local(path));
                }
                Ok(())
            }
            Decision::Delete => {
                remote_deletes.push((path.to_path_buf(), id));
                remote.remove_subtree(path);
                Ok(())
            }
        }
    }

    fn decide(&mut self, path: &Utf8Path, kind: ObjectKind, missing: Side) -> Result<Decision, SyncError> {
        if let Some(decision) = policy_for(self.direction, missing) {
            return Ok(decision);
        }
        let absence = Absence {
            path: path.to_path_buf(),
            kind,
            missing,
        };
        match self.decider.as_deref_mut() {
            Some(decider) => decider.decide(&absence),
            None => Err(SyncError::Config(
                "Interactive sync needs a decision prompt".to_string(),
            )),
        }
    }

    fn defer(&mut self, path: &Utf8Path, missing: Side) {
        debug!("Deferring {} to the restore pass", path);
        self.restore_targets.push(RestoreTarget {
            path: path.to_path_buf(),
            missing,
        });
    }

    fn is_deferred(&self, path: &Utf8Path) -> bool {
        self.restore_targets
            .iter()
            .any(|target| path.starts_with(&target.path))
    }
}

/// Leave alone names that are a file on one side and a folder on the other
///
/// Neither side can hold both under one name, so the pair is reported and
/// the folder's subtree is dropped from its forest.
fn skip_kind_mismatches(
    local_node: &mut TreeNode,
    remote_node: &mut TreeNode,
    local: &mut Forest,
    remote: &mut Forest,
) {
    let clashes: Vec<(String, Side)> = local_node
        .files
        .keys()
        .filter(|name| remote_node.dirs.contains_key(*name))
        .map(|name| (name.clone(), Side::Remote))
        .chain(
            remote_node
                .files
                .keys()
                .filter(|name| local_node.dirs.contains_key(*name))
                .map(|name| (name.clone(), Side::Local)),
        )
        .collect();

    for (name, folder_side) in clashes {
        let path = local_node.child_path(&name);
        warn!(
            "{} is a file on one side and a folder on the other, skipping it",
            path
        );
        local_node.files.remove(&name);
        remote_node.files.remove(&name);
        local_node.dirs.remove(&name);
        remote_node.dirs.remove(&name);
        match folder_side {
            Side::Local => local.remove_subtree(&path),
            Side::Remote => remote.remove_subtree(&path),
        };
    }
}

fn remote_id(path: &Utf8Path, id: Option<String>) -> Result<String, SyncError> {
    id.ok_or_else(|| SyncError::Validation(format!("Remote entry {} has no identifier", path)))
}
