//! Executor - Side-effecting operations against both stores
//!
//! Every mutation made by the reconciler, the restore pass and the
//! partial-update applier goes through an [`Executor`], which performs the
//! store call, logs it, notifies the optional callback and records the
//! action in the run's [`SyncReport`].

use crate::diff::SyncReport;
use crate::resolve::{resolve_path, IdCache, ResolveMode};
use crate::store::{LocalStore, RemoteStore};
use crate::types::{SyncAction, SyncError};
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use tracing::{info, warn};

/// Optional callback notified after each performed action
pub type ActionCallback = dyn Fn(&SyncAction) + Send + Sync;

/// Performs and records mutations for one run
pub struct Executor<'a> {
    local: &'a dyn LocalStore,
    remote: &'a mut dyn RemoteStore,
    report: SyncReport,
    on_action: Option<&'a ActionCallback>,
}

impl<'a> Executor<'a> {
    /// Create an executor over both stores
    pub fn new(local: &'a dyn LocalStore, remote: &'a mut dyn RemoteStore) -> Self {
        Self {
            local,
            remote,
            report: SyncReport::new(),
            on_action: None,
        }
    }

    /// Notify `callback` after each performed action
    pub fn with_callback(mut self, callback: &'a ActionCallback) -> Self {
        self.on_action = Some(callback);
        self
    }

    pub fn local(&self) -> &dyn LocalStore {
        self.local
    }

    /// Remote store, for lookups that do not mutate
    pub fn remote(&mut self) -> &mut dyn RemoteStore {
        &mut *self.remote
    }

    pub fn report(&self) -> &SyncReport {
        &self.report
    }

    pub fn into_report(self) -> SyncReport {
        self.report
    }

    /// Create the remote folder for `path` under `parent_id`, returning its identifier
    pub fn create_remote_dir(&mut self, path: &Utf8Path, parent_id: &str) -> Result<String, SyncError> {
        let id = self.remote.create_folder(name_of(path)?, parent_id)?;
        self.record(SyncAction::CreateRemoteDir {
            path: path.to_path_buf(),
        });
        Ok(id)
    }

    /// Resolve `path` below `root_id`, creating whatever folders are missing
    ///
    /// A single [`SyncAction::CreateRemoteDir`] is recorded for `path` when
    /// anything had to be created.
    pub fn ensure_remote_dir(
        &mut self,
        root_id: &str,
        path: &Utf8Path,
        cache: Option<&mut IdCache>,
    ) -> Result<String, SyncError> {
        let resolved = resolve_path(&mut *self.remote, root_id, path.as_str(), ResolveMode::Create, cache)?;
        if !resolved.found {
            self.record(SyncAction::CreateRemoteDir {
                path: path.to_path_buf(),
            });
        }
        Ok(resolved.id)
    }

    /// Upload the local file at `path` as a new object under `parent_id`
    pub fn upload(&mut self, path: &Utf8Path, parent_id: &str, mtime: i64) -> Result<String, SyncError> {
        let content = self.local.read_file(path)?;
        let id = self
            .remote
            .upload_file(name_of(path)?, parent_id, &content, mtime)?;
        self.record(SyncAction::Upload {
            path: path.to_path_buf(),
            mtime,
        });
        Ok(id)
    }

    /// Replace the content of remote object `id` with the local file at `path`
    pub fn update_remote(&mut self, path: &Utf8Path, id: &str, mtime: i64) -> Result<(), SyncError> {
        let content = self.local.read_file(path)?;
        self.remote.update_file(id, &content, mtime)?;
        self.record(SyncAction::UpdateRemote {
            path: path.to_path_buf(),
            mtime,
        });
        Ok(())
    }

    /// Write remote object `id` to the local `path`, stamped with `mtime`
    pub fn download(&mut self, path: &Utf8Path, id: &str, mtime: i64) -> Result<(), SyncError> {
        let content = self.remote.download_file(id)?;
        self.local.write_file(path, &content, mtime)?;
        self.record(SyncAction::Download {
            path: path.to_path_buf(),
            mtime,
        });
        Ok(())
    }

    pub fn create_local_dir(&mut self, path: &Utf8Path) -> Result<(), SyncError> {
        self.local.create_dir(path)?;
        self.record(SyncAction::CreateLocalDir {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    pub fn delete_local_file(&mut self, path: &Utf8Path) -> Result<(), SyncError> {
        self.local.remove_file(path)?;
        self.record(SyncAction::DeleteLocalFile {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    pub fn delete_local_dir(&mut self, path: &Utf8Path) -> Result<(), SyncError> {
        self.local.remove_dir_all(path)?;
        self.record(SyncAction::DeleteLocalDir {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Delete several remote objects in one request
    ///
    /// Objects that were already gone are logged and otherwise ignored.
    pub fn delete_remote_batch(&mut self, targets: &[(Utf8PathBuf, String)]) -> Result<(), SyncError> {
        if targets.is_empty() {
            return Ok(());
        }

        // The same object may be named twice; delete and record it once
        let mut seen = HashSet::new();
        let targets: Vec<&(Utf8PathBuf, String)> = targets
            .iter()
            .filter(|(_, id)| seen.insert(id.as_str()))
            .collect();

        let ids: Vec<String> = targets.iter().map(|(_, id)| id.clone()).collect();
        let missing = self.remote.delete_batch(&ids)?;

        for (path, id) in targets {
            if missing.contains(id) {
                warn!("Remote object {} ({}) was already deleted", path, id);
                continue;
            }
            self.record(SyncAction::DeleteRemote { path: path.clone() });
        }
        Ok(())
    }

    /// Delete one remote object, returning false if it was already gone
    pub fn delete_remote(&mut self, path: &Utf8Path, id: &str) -> Result<bool, SyncError> {
        match self.remote.delete(id) {
            Ok(()) => {
                self.record(SyncAction::DeleteRemote {
                    path: path.to_path_buf(),
                });
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                warn!("Remote object {} ({}) was already deleted", path, id);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Re-parent remote object `id` under `new_parent_id`
    pub fn move_remote(
        &mut self,
        from: &Utf8Path,
        to: &Utf8Path,
        id: &str,
        new_parent_id: &str,
    ) -> Result<(), SyncError> {
        self.remote.move_to(id, new_parent_id)?;
        self.record(SyncAction::MoveRemote {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }

    /// Rename remote object `id` to the last segment of `to`
    pub fn rename_remote(&mut self, from: &Utf8Path, to: &Utf8Path, id: &str) -> Result<(), SyncError> {
        self.remote.rename(id, name_of(to)?)?;
        self.record(SyncAction::RenameRemote {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        Ok(())
    }

    fn record(&mut self, action: SyncAction) {
        info!("{} {}", action.action_name(), action.path());
        if let Some(callback) = self.on_action {
            callback(&action);
        }
        self.report.record(action);
    }
}

fn name_of(path: &Utf8Path) -> Result<&str, SyncError> {
    path.file_name()
        .ok_or_else(|| SyncError::Validation(format!("Path has no final segment: '{}'", path)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FsLocalStore, MemoryRemote};
    use std::fs;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn local_store(temp: &TempDir) -> FsLocalStore {
        FsLocalStore::from_path(temp.path()).expect("utf-8 temp path")
    }

    #[test]
    fn test_upload_and_update_remote() {
        let temp = TempDir::new().expect("create temp dir");
        fs::write(temp.path().join("f.txt"), b"v1").expect("write v1");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();

        let id = {
            let mut executor = Executor::new(&local, &mut remote);
            let id = executor.upload(Utf8Path::new("f.txt"), "root", 10).expect("upload");
            fs::write(temp.path().join("f.txt"), b"v2").expect("write v2");
            executor
                .update_remote(Utf8Path::new("f.txt"), &id, 20)
                .expect("update");
            assert_eq!(executor.report().stats.uploads, 1);
            assert_eq!(executor.report().stats.remote_updates, 1);
            id
        };

        assert_eq!(remote.content(&id), Some(&b"v2"[..]));
        assert_eq!(remote.modified(&id), Some(20));
        assert_eq!(remote.find_path("f.txt"), Some(id));
    }

    #[test]
    fn test_download_stamps_mtime() {
        let temp = TempDir::new().expect("create temp dir");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();
        let id = remote.put_file("d.txt", b"remote", 77).expect("seed");

        let mut executor = Executor::new(&local, &mut remote);
        executor
            .download(&Utf8Path::new("sub").join("d.txt"), &id, 77)
            .expect("download");

        assert_eq!(fs::read(temp.path().join("sub/d.txt")).expect("read"), b"remote");
        assert_eq!(
            local.modified_time(&Utf8Path::new("sub").join("d.txt")).expect("mtime"),
            77
        );
    }

    #[test]
    fn test_delete_remote_batch_skips_missing() {
        let temp = TempDir::new().expect("create temp dir");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();
        let id = remote.put_file("gone.txt", b"", 1).expect("seed");

        let mut executor = Executor::new(&local, &mut remote);
        executor
            .delete_remote_batch(&[
                (Utf8PathBuf::from("gone.txt"), id),
                (Utf8PathBuf::from("ghost.txt"), "ghost".to_string()),
            ])
            .expect("batch delete");

        let report = executor.into_report();
        assert_eq!(report.stats.remote_deletes, 1);
        assert_eq!(report.actions[0].path(), Utf8Path::new("gone.txt"));
    }

    #[test]
    fn test_delete_remote_tolerates_not_found() {
        let temp = TempDir::new().expect("create temp dir");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();

        let mut executor = Executor::new(&local, &mut remote);
        let deleted = executor
            .delete_remote(Utf8Path::new("x"), "nope")
            .expect("tolerated");

        assert!(!deleted);
        assert!(executor.report().is_empty());
    }

    #[test]
    fn test_move_and_rename_remote() {
        let temp = TempDir::new().expect("create temp dir");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();
        let file = remote.put_file("a/f.txt", b"x", 1).expect("seed file");
        let dest = remote.put_folder("b").expect("seed folder");

        {
            let mut executor = Executor::new(&local, &mut remote);
            executor
                .move_remote(Utf8Path::new("a/f.txt"), Utf8Path::new("b/f.txt"), &file, &dest)
                .expect("move");
            executor
                .rename_remote(Utf8Path::new("b/f.txt"), Utf8Path::new("b/g.txt"), &file)
                .expect("rename");
            assert_eq!(executor.report().stats.moves, 1);
            assert_eq!(executor.report().stats.renames, 1);
        }

        assert_eq!(remote.find_path("b/g.txt"), Some(file));
    }

    #[test]
    fn test_local_dir_lifecycle() {
        let temp = TempDir::new().expect("create temp dir");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();
        let mut executor = Executor::new(&local, &mut remote);

        executor.create_local_dir(Utf8Path::new("d")).expect("mkdir");
        fs::write(temp.path().join("d/f"), b"x").expect("write");
        executor.delete_local_file(Utf8Path::new("d/f")).expect("rm file");
        executor.delete_local_dir(Utf8Path::new("d")).expect("rm dir");

        assert!(!temp.path().join("d").exists());
        assert_eq!(executor.report().stats.local_dirs_created, 1);
        assert_eq!(executor.report().stats.local_deletes, 2);
    }

    #[test]
    fn test_ensure_remote_dir_records_only_creations() {
        let temp = TempDir::new().expect("create temp dir");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();
        let mut cache = IdCache::new();

        let mut executor = Executor::new(&local, &mut remote);
        let created = executor
            .ensure_remote_dir("root", Utf8Path::new("p/q"), Some(&mut cache))
            .expect("create chain");
        let again = executor
            .ensure_remote_dir("root", Utf8Path::new("p/q"), Some(&mut cache))
            .expect("resolve again");

        assert_eq!(created, again);
        assert_eq!(executor.report().len(), 1);
    }

    #[test]
    fn test_callback_sees_every_action() {
        let temp = TempDir::new().expect("create temp dir");
        let local = local_store(&temp);
        let mut remote = MemoryRemote::new();

        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_ref = Arc::clone(&seen);
        let callback = move |action: &SyncAction| {
            seen_ref
                .lock()
                .expect("lock seen")
                .push(action.action_name().to_string());
        };

        let mut executor = Executor::new(&local, &mut remote).with_callback(&callback);
        executor
            .create_remote_dir(Utf8Path::new("new"), "root")
            .expect("mkdir remote");
        executor.create_local_dir(Utf8Path::new("new")).expect("mkdir local");

        let snapshot = seen.lock().expect("lock snapshot").clone();
        assert_eq!(snapshot, vec!["Mkdir remote", "Mkdir local"]);
    }
}
