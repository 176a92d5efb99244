//! SyncReport - Actions performed during a run and their counters

use crate::types::SyncAction;
use std::fmt;

/// Every mutation a run performed, in order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Performed actions
    pub actions: Vec<SyncAction>,

    /// Aggregate counters
    pub stats: ReportStats,
}

impl SyncReport {
    /// Create a new empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an action and update the counters
    pub fn record(&mut self, action: SyncAction) {
        match &action {
            SyncAction::CreateRemoteDir { .. } => self.stats.remote_dirs_created += 1,
            SyncAction::Upload { .. } => self.stats.uploads += 1,
            SyncAction::UpdateRemote { .. } => self.stats.remote_updates += 1,
            SyncAction::Download { .. } => self.stats.downloads += 1,
            SyncAction::CreateLocalDir { .. } => self.stats.local_dirs_created += 1,
            SyncAction::DeleteLocalFile { .. } | SyncAction::DeleteLocalDir { .. } => {
                self.stats.local_deletes += 1
            }
            SyncAction::DeleteRemote { .. } => self.stats.remote_deletes += 1,
            SyncAction::MoveRemote { .. } => self.stats.moves += 1,
            SyncAction::RenameRemote { .. } => self.stats.renames += 1,
        }

        self.actions.push(action);
    }

    /// Number of recorded actions
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Check if the run changed nothing
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Check if any recorded action removed data
    pub fn has_deletes(&self) -> bool {
        self.actions.iter().any(SyncAction::is_delete)
    }
}

/// Per-kind action counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportStats {
    pub remote_dirs_created: usize,
    pub uploads: usize,
    pub remote_updates: usize,
    pub downloads: usize,
    pub local_dirs_created: usize,
    /// Local files and directories removed
    pub local_deletes: usize,
    pub remote_deletes: usize,
    pub moves: usize,
    pub renames: usize,
}

impl ReportStats {
    /// Number of deletions on either side
    pub fn deletes(&self) -> usize {
        self.local_deletes + self.remote_deletes
    }
}

impl fmt::Display for ReportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} uploaded, {} updated, {} downloaded, {} dirs created, {} deleted, {} moved, {} renamed",
            self.uploads,
            self.remote_updates,
            self.downloads,
            self.remote_dirs_created + self.local_dirs_created,
            self.deletes(),
            self.moves,
            self.renames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_record_updates_counters() {
        let mut report = SyncReport::new();
        report.record(SyncAction::CreateRemoteDir {
            path: Utf8PathBuf::from("a"),
        });
        report.record(SyncAction::Upload {
            path: Utf8PathBuf::from("a/f"),
            mtime: 1,
        });
        report.record(SyncAction::Download {
            path: Utf8PathBuf::from("g"),
            mtime: 2,
        });
        report.record(SyncAction::DeleteRemote {
            path: Utf8PathBuf::from("h"),
        });

        assert_eq!(report.len(), 4);
        assert_eq!(report.stats.remote_dirs_created, 1);
        assert_eq!(report.stats.uploads, 1);
        assert_eq!(report.stats.downloads, 1);
        assert_eq!(report.stats.deletes(), 1);
        assert!(report.has_deletes());
    }

    #[test]
    fn test_empty_report() {
        let report = SyncReport::new();
        assert!(report.is_empty());
        assert!(!report.has_deletes());
        assert_eq!(
            report.stats.to_string(),
            "0 uploaded, 0 updated, 0 downloaded, 0 dirs created, 0 deleted, 0 moved, 0 renamed"
        );
    }
}
