//! Partial update command

use crate::apply::PartialApplier;
use crate::diff::SyncReport;
use crate::executor::Executor;
use crate::store::{FsLocalStore, RemoteStore};
use crate::types::{normalize_rel_path, SyncAction, SyncError};
use crate::ui::ProgressReporter;
use crate::Config;
use std::sync::Arc;
use tracing::info;

/// Replay the configured action batch against the remote folder
///
/// No tree is scanned; each entry is resolved on its own.
pub fn run_partial(
    config: &Config,
    remote: &mut dyn RemoteStore,
    reporter: Arc<ProgressReporter>,
) -> Result<SyncReport, SyncError> {
    config.validate()?;
    let batch = config.actions.as_ref().ok_or_else(|| {
        SyncError::Config("partial_update mode requires --actions_json".to_string())
    })?;

    let local = FsLocalStore::from_path(&config.local_root)?;
    let on_action = {
        let reporter = Arc::clone(&reporter);
        move |action: &SyncAction| reporter.action(action)
    };
    let mut executor = Executor::new(&local, remote).with_callback(&on_action);

    let root_id = executor.remote().root_id();
    let remote_path = normalize_rel_path(&config.remote_path);
    let sync_root = executor.ensure_remote_dir(&root_id, &remote_path, None)?;
    info!(
        "Applying {} batched changes under remote folder {}",
        batch.len(),
        remote_path
    );

    PartialApplier::new(&mut executor, sync_root).apply(batch)?;

    let report = executor.into_report();
    reporter.finish(&report.stats);
    info!("Partial update complete: {}", report.stats);
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncMode;
    use crate::store::MemoryRemote;
    use crate::types::ActionBatch;
    use std::fs;
    use tempfile::TempDir;

    fn partial_config(temp: &TempDir, json: &str) -> Config {
        let mut config = Config::new(temp.path(), "docs");
        config.mode = SyncMode::PartialUpdate;
        config.actions = Some(ActionBatch::from_json(json).expect("valid batch"));
        config
    }

    #[test]
    fn test_applies_batch_under_remote_folder() {
        let temp = TempDir::new().expect("create temp dir");
        fs::create_dir_all(temp.path().join("notes")).expect("mkdir");
        fs::write(temp.path().join("notes/a.md"), b"alpha").expect("write");
        let mut remote = MemoryRemote::new();

        let config = partial_config(&temp, r#"{"createFile": ["notes/a.md"]}"#);
        let report = run_partial(&config, &mut remote, Arc::new(ProgressReporter::hidden()))
            .expect("partial update");

        assert_eq!(report.stats.uploads, 1);
        let id = remote.find_path("docs/notes/a.md").expect("uploaded");
        assert_eq!(remote.content(&id), Some(&b"alpha"[..]));
    }

    #[test]
    fn test_requires_actions() {
        let temp = TempDir::new().expect("create temp dir");
        let mut config = Config::new(temp.path(), "docs");
        config.mode = SyncMode::PartialUpdate;
        let mut remote = MemoryRemote::new();

        let err = run_partial(&config, &mut remote, Arc::new(ProgressReporter::hidden()))
            .unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(remote.mutation_count(), 0);
    }
}
