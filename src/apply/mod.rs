//! Partial-Update Applier - Mirrors an externally decided action batch
//!
//! No snapshot is taken and nothing is compared: the caller already knows
//! what changed locally, and the applier replays it onto the remote side in
//! a fixed, dependency-safe order. One [`IdCache`] is shared across the whole
//! batch since actions frequently touch sibling paths.

use crate::executor::Executor;
use crate::resolve::{resolve_path, split_parent, IdCache, ResolveMode, Resolved};
use crate::store::{LocalKind, SearchScope};
use crate::types::{checked_rel_path, normalize_rel_path, ActionBatch, SyncError};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

/// Applies one [`ActionBatch`] below a remote root folder
pub struct PartialApplier<'r, 'a> {
    executor: &'r mut Executor<'a>,
    root_id: String,
    cache: IdCache,
}

impl<'r, 'a> PartialApplier<'r, 'a> {
    pub fn new(executor: &'r mut Executor<'a>, root_id: impl Into<String>) -> Self {
        Self {
            executor,
            root_id: root_id.into(),
            cache: IdCache::new(),
        }
    }

    /// Apply `batch` in order: createDir, deleteDir, deleteFile, move/rename,
    /// then createFile/updateFile
    pub fn apply(mut self, batch: &ActionBatch) -> Result<(), SyncError> {
        debug!("Applying {} requested actions", batch.len());
        validate_paths(batch)?;

        for raw in &batch.create_dir {
            let path = normalize_rel_path(raw);
            self.executor
                .ensure_remote_dir(&self.root_id, &path, Some(&mut self.cache))?;
        }

        for raw in &batch.delete_dir {
            self.delete_dir(&normalize_rel_path(raw))?;
        }

        self.delete_files(&batch.delete_file)?;

        for (from, to) in batch.moves.iter().chain(batch.rename.iter()) {
            self.relocate(&normalize_rel_path(from), &normalize_rel_path(to))?;
        }

        for raw in batch.create_file.iter().chain(batch.update_file.iter()) {
            let path = normalize_rel_path(raw);
            match self.executor.local().kind(&path)? {
                Some(LocalKind::File { mtime }) => self.put_file(&path, mtime)?,
                Some(LocalKind::Dir) => {
                    warn!("{} is a directory, expected a file; uploading it as a directory", path);
                    self.upload_dir(&path)?;
                }
                None => return Err(SyncError::LocalNotFound { path }),
            }
        }

        Ok(())
    }

    fn delete_dir(&mut self, path: &Utf8Path) -> Result<(), SyncError> {
        if path.as_str().is_empty() {
            warn!("Refusing to delete the sync root");
            return Ok(());
        }

        let resolved = self.lookup(path)?;
        if !resolved.found {
            warn!("Remote folder {} not found, nothing to delete", path);
            return Ok(());
        }
        self.executor.delete_remote(path, &resolved.id)?;
        self.cache.purge_under(path.as_str());
        Ok(())
    }

    fn delete_files(&mut self, raw_paths: &[String]) -> Result<(), SyncError> {
        let mut targets: Vec<(Utf8PathBuf, String)> = Vec::new();
        for raw in raw_paths {
            let path = normalize_rel_path(raw);
            match self.find_object(&path, SearchScope::Files)? {
                Some((id, _)) => targets.push((path, id)),
                None => warn!("Remote file {} not found, nothing to delete", path),
            }
        }
        self.executor.delete_remote_batch(&targets)
    }

    /// Move and/or rename, falling back to an upload of the new local path
    /// when the old object does not exist remotely
    fn relocate(&mut self, from: &Utf8Path, to: &Utf8Path) -> Result<(), SyncError> {
        let Some((id, old_parent_id)) = self.find_object(from, SearchScope::Any)? else {
            warn!("{} not found remotely, uploading {} instead", from, to);
            return self.upload_local(to);
        };

        let (new_parent, new_name) = parts(to)?;
        let (_, old_name) = parts(from)?;
        let new_parent_id =
            self.executor
                .ensure_remote_dir(&self.root_id, &new_parent, Some(&mut self.cache))?;

        if new_parent_id != old_parent_id {
            self.executor.move_remote(from, to, &id, &new_parent_id)?;
        }
        if new_name != old_name {
            self.executor.rename_remote(from, to, &id)?;
        }
        self.cache.purge_under(from.as_str());
        Ok(())
    }

    fn upload_local(&mut self, path: &Utf8Path) -> Result<(), SyncError> {
        match self.executor.local().kind(path)? {
            Some(LocalKind::File { mtime }) => self.put_file(path, mtime),
            Some(LocalKind::Dir) => self.upload_dir(path),
            None => {
                warn!("{} does not exist locally either, skipped", path);
                Ok(())
            }
        }
    }

    fn upload_dir(&mut self, path: &Utf8Path) -> Result<(), SyncError> {
        self.executor
            .ensure_remote_dir(&self.root_id, path, Some(&mut self.cache))?;
        for child in self.executor.local().list_children(path)? {
            let child_path = path.join(&child.name);
            match child.kind {
                LocalKind::File { mtime } => self.put_file(&child_path, mtime)?,
                LocalKind::Dir => self.upload_dir(&child_path)?,
            }
        }
        Ok(())
    }

    /// Update the remote file in place if it exists, upload it otherwise
    fn put_file(&mut self, path: &Utf8Path, mtime: i64) -> Result<(), SyncError> {
        let (parent, name) = parts(path)?;
        let parent_id = self
            .executor
            .ensure_remote_dir(&self.root_id, &parent, Some(&mut self.cache))?;
        let matches = self
            .executor
            .remote()
            .search(&name, &parent_id, SearchScope::Files)?;

        match first_match(matches, path) {
            Some(id) => self.executor.update_remote(path, &id, mtime),
            None => self.executor.upload(path, &parent_id, mtime).map(|_| ()),
        }
    }

    /// Identifier and parent identifier of the object at `path`, without creating anything
    fn find_object(
        &mut self,
        path: &Utf8Path,
        scope: SearchScope,
    ) -> Result<Option<(String, String)>, SyncError> {
        let (parent, name) = parts(path)?;
        let resolved = self.lookup(&parent)?;
        if !resolved.found {
            return Ok(None);
        }
        let matches = self.executor.remote().search(&name, &resolved.id, scope)?;
        Ok(first_match(matches, path).map(|id| (id, resolved.id)))
    }

    fn lookup(&mut self, path: &Utf8Path) -> Result<Resolved, SyncError> {
        resolve_path(
            self.executor.remote(),
            &self.root_id,
            path.as_str(),
            ResolveMode::NoCreate,
            Some(&mut self.cache),
        )
    }
}

/// Reject the whole batch before any mutation if one path leaves the sync root
fn validate_paths(batch: &ActionBatch) -> Result<(), SyncError> {
    let lists = batch
        .create_dir
        .iter()
        .chain(&batch.delete_dir)
        .chain(&batch.delete_file)
        .chain(&batch.create_file)
        .chain(&batch.update_file);
    let pairs = batch
        .moves
        .iter()
        .chain(&batch.rename)
        .flat_map(|(from, to)| [from, to]);

    for raw in lists.chain(pairs) {
        checked_rel_path(raw)?;
    }
    Ok(())
}

fn parts(path: &Utf8Path) -> Result<(Utf8PathBuf, String), SyncError> {
    split_parent(path.as_str())
        .map(|(parent, name)| (Utf8PathBuf::from(parent), name))
        .ok_or_else(|| SyncError::Validation(format!("Action path '{}' names no object", path)))
}

fn first_match(ids: Vec<String>, path: &Utf8Path) -> Option<String> {
    if ids.len() > 1 {
        warn!("{} remote objects at {}; using the first match", ids.len(), path);
    }
    ids.into_iter().next()
}
