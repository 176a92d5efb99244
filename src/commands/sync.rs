//! Full sync command

use crate::diff::{Absence, Decider, Decision, ObjectKind, Reconciler, RestorePass, SyncReport};
use crate::executor::Executor;
use crate::filter::filter_forests;
use crate::resolve::{resolve_path, ResolveMode};
use crate::scanner::{build_local_forest, build_remote_forest, ProgressCallback};
use crate::store::{FsLocalStore, RemoteStore};
use crate::types::{normalize_rel_path, SyncAction, SyncDirection, SyncError};
use crate::ui::ProgressReporter;
use crate::Config;
use camino::Utf8Path;
use chrono::Utc;
use std::sync::Arc;
use tracing::info;

/// Run a full two-sided reconciliation
///
/// Both trees are scanned from scratch, filtered, reconciled tier by tier
/// and, for mirror and interactive runs, one-sided subtrees are restored
/// afterwards. `decider` is only consulted in the interactive direction.
pub fn run_full(
    config: &Config,
    remote: &mut dyn RemoteStore,
    decider: Option<&mut dyn Decider>,
    reporter: Arc<ProgressReporter>,
) -> Result<SyncReport, SyncError> {
    config.validate()?;
    let local = FsLocalStore::from_path(&config.local_root)?;
    let on_action = {
        let reporter = Arc::clone(&reporter);
        move |action: &SyncAction| reporter.action(action)
    };
    let mut executor = Executor::new(&local, remote).with_callback(&on_action);

    let sync_root = resolve_sync_root(&mut executor, config)?;
    info!(
        "Syncing {} with remote folder {} ({:?})",
        config.local_root.display(),
        sync_root,
        config.direction
    );

    reporter.start_scan("local");
    let local_progress: ProgressCallback = {
        let reporter = Arc::clone(&reporter);
        Box::new(move |dirs: u64, files: u64| reporter.update_scan("local", dirs, files))
    };
    let mut local_forest = build_local_forest(&local, Some(&local_progress))?;
    reporter.finish_scan("local", local_forest.len(), local_forest.file_count());

    reporter.start_scan("remote");
    let remote_progress: ProgressCallback = {
        let reporter = Arc::clone(&reporter);
        Box::new(move |dirs: u64, files: u64| reporter.update_scan("remote", dirs, files))
    };
    let mut remote_forest = build_remote_forest(
        executor.remote(),
        &sync_root,
        config.page_size,
        Some(&remote_progress),
    )?;
    reporter.finish_scan("remote", remote_forest.len(), remote_forest.file_count());

    filter_forests(&mut local_forest, &mut remote_forest, &config.ignore_rules);

    let mut decider = match config.direction {
        SyncDirection::Interactive => decider.map(|inner| SuspendedProgress {
            inner,
            reporter: &*reporter,
        }),
        _ => None,
    };

    let mut reconciler = Reconciler::new(config.direction, &mut executor);
    if let Some(decider) = decider.as_mut() {
        reconciler = reconciler.with_decider(decider);
    }
    let targets = reconciler.run(&mut local_forest, &mut remote_forest)?;

    if !targets.is_empty() {
        let mut restore = RestorePass::new(&mut executor);
        if let Some(decider) = decider.as_mut() {
            restore = restore.with_decider(decider);
        }
        restore.run(&targets, &mut local_forest, &mut remote_forest)?;
    }

    let report = executor.into_report();
    reporter.finish(&report.stats);
    info!("Sync complete: {}", report.stats);
    Ok(report)
}

/// Decider whose questions are asked with the progress bars cleared
struct SuspendedProgress<'a, 'd> {
    inner: &'a mut (dyn Decider + 'd),
    reporter: &'a ProgressReporter,
}

impl Decider for SuspendedProgress<'_, '_> {
    fn decide(&mut self, absence: &Absence) -> Result<Decision, SyncError> {
        let inner = &mut *self.inner;
        self.reporter.suspend(|| inner.decide(absence))
    }

    fn confirm_restore(&mut self, path: &Utf8Path, kind: ObjectKind) -> Result<bool, SyncError> {
        let inner = &mut *self.inner;
        self.reporter.suspend(|| inner.confirm_restore(path, kind))
    }
}

/// Folder identifier the run syncs into
///
/// The remote path is created when missing. With `--new` an existing folder
/// is left alone and a timestamped sibling is created instead.
fn resolve_sync_root(executor: &mut Executor<'_>, config: &Config) -> Result<String, SyncError> {
    let root_id = executor.remote().root_id();
    let remote_path = normalize_rel_path(&config.remote_path);

    if config.create_new {
        let existing = resolve_path(
            executor.remote(),
            &root_id,
            remote_path.as_str(),
            ResolveMode::NoCreate,
            None,
        )?;
        if existing.found {
            let parent_id = executor
                .remote()
                .parent_id(&existing.id)?
                .unwrap_or_else(|| root_id.clone());
            let name = format!(
                "{}_{}",
                remote_path.file_name().unwrap_or("sync"),
                Utc::now().timestamp()
            );
            let fresh = remote_path.with_file_name(name);
            info!("{} already exists, syncing into {}", remote_path, fresh);
            return executor.create_remote_dir(&fresh, &parent_id);
        }
    }

    executor.ensure_remote_dir(&root_id, &remote_path, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::FixedDecider;
    use crate::store::MemoryRemote;
    use std::fs;
    use tempfile::TempDir;

    fn hidden() -> Arc<ProgressReporter> {
        Arc::new(ProgressReporter::hidden())
    }

    #[test]
    fn test_push_creates_remote_root_and_uploads() {
        let temp = TempDir::new().expect("create temp dir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write");
        let config = Config::new(temp.path(), "backup/laptop");
        let mut remote = MemoryRemote::new();

        let report = run_full(&config, &mut remote, None, hidden()).expect("sync");

        assert_eq!(report.stats.uploads, 1);
        assert_eq!(report.stats.remote_dirs_created, 1);
        assert!(remote.find_path("backup/laptop/a.txt").is_some());
    }

    #[test]
    fn test_new_creates_timestamped_sibling() {
        let temp = TempDir::new().expect("create temp dir");
        fs::write(temp.path().join("a.txt"), b"a").expect("write");
        let mut remote = MemoryRemote::new();
        remote.put_file("backup/old.txt", b"o", 1).expect("seed");

        let mut config = Config::new(temp.path(), "backup");
        config.create_new = true;
        let report = run_full(&config, &mut remote, None, hidden()).expect("sync");

        // The existing folder is untouched
        assert!(remote.find_path("backup/old.txt").is_some());
        assert!(remote.find_path("backup/a.txt").is_none());

        let created = report
            .actions
            .iter()
            .find_map(|action| match action {
                SyncAction::CreateRemoteDir { path } => Some(path.clone()),
                _ => None,
            })
            .expect("fresh folder recorded");
        assert!(created.as_str().starts_with("backup_"));
        assert!(remote.find_path(&format!("{}/a.txt", created)).is_some());
    }

    #[test]
    fn test_new_on_missing_folder_just_creates_it() {
        let temp = TempDir::new().expect("create temp dir");
        let mut remote = MemoryRemote::new();
        let mut config = Config::new(temp.path(), "fresh");
        config.create_new = true;

        run_full(&config, &mut remote, None, hidden()).expect("sync");
        assert!(remote.find_path("fresh").is_some());
    }

    #[test]
    fn test_decider_ignored_outside_interactive() {
        let temp = TempDir::new().expect("create temp dir");
        let mut remote = MemoryRemote::new();
        remote.put_file("r.txt", b"r", 1).expect("seed");
        let config = Config::new(temp.path(), "");

        // pushOnly deletes the remote-only file even if a decider would create it
        let mut decider = FixedDecider::always_create();
        let report = run_full(&config, &mut remote, Some(&mut decider), hidden()).expect("sync");

        assert_eq!(report.stats.remote_deletes, 1);
        assert!(!temp.path().join("r.txt").exists());
    }

    #[derive(Default)]
    struct CountingDecider {
        decisions: usize,
        restores: usize,
    }

    impl Decider for CountingDecider {
        fn decide(&mut self, _absence: &Absence) -> Result<Decision, SyncError> {
            self.decisions += 1;
            Ok(Decision::Create)
        }

        fn confirm_restore(&mut self, _path: &Utf8Path, _kind: ObjectKind) -> Result<bool, SyncError> {
            self.restores += 1;
            Ok(true)
        }
    }

    #[test]
    fn test_interactive_questions_reach_the_decider() {
        let temp = TempDir::new().expect("create temp dir");
        fs::write(temp.path().join("l.txt"), b"l").expect("write");
        let mut remote = MemoryRemote::new();
        remote.put_file("r/deep.txt", b"r", 1).expect("seed");
        let mut config = Config::new(temp.path(), "");
        config.direction = SyncDirection::Interactive;

        let mut decider = CountingDecider::default();
        let report = run_full(&config, &mut remote, Some(&mut decider), hidden()).expect("sync");

        assert_eq!(decider.decisions, 2);
        assert!(decider.restores >= 1);
        assert_eq!(report.stats.uploads, 1);
        assert!(temp.path().join("r/deep.txt").exists());
    }

    #[test]
    fn test_invalid_config_fails_before_mutation() {
        let temp = TempDir::new().expect("create temp dir");
        let mut remote = MemoryRemote::new();
        let config = Config::new(temp.path().join("missing"), "x");

        let err = run_full(&config, &mut remote, None, hidden()).unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(remote.mutation_count(), 0);
    }
}
