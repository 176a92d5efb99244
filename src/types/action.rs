//! SyncAction - Mutations performed during a run

use camino::{Utf8Path, Utf8PathBuf};

/// Which tree an object lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Local,
    Remote,
}

/// Deletion/creation policy for objects present on only one side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Deserialize)]
pub enum SyncDirection {
    /// Local is authoritative for absence
    #[default]
    #[value(name = "pushOnly")]
    #[serde(rename = "pushOnly")]
    PushOnly,

    /// Remote is authoritative for absence
    #[value(name = "pullOnly")]
    #[serde(rename = "pullOnly")]
    PullOnly,

    /// Never delete; back-fill whatever is missing on either side
    #[value(name = "mirror")]
    #[serde(rename = "mirror")]
    Mirror,

    /// Ask per object whether to create or delete
    #[value(name = "interactive")]
    #[serde(rename = "interactive")]
    Interactive,
}

impl SyncDirection {
    /// Side whose forest is iterated tier by tier
    pub fn driving_side(self) -> Side {
        match self {
            SyncDirection::PushOnly => Side::Local,
            SyncDirection::PullOnly | SyncDirection::Mirror | SyncDirection::Interactive => {
                Side::Remote
            }
        }
    }
}

/// A mutation performed against one of the stores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncAction {
    /// Folder created on the remote side
    CreateRemoteDir { path: Utf8PathBuf },

    /// New remote file uploaded from local
    Upload { path: Utf8PathBuf, mtime: i64 },

    /// Existing remote file content replaced in place
    UpdateRemote { path: Utf8PathBuf, mtime: i64 },

    /// Remote file written to the local side (new or overwrite)
    Download { path: Utf8PathBuf, mtime: i64 },

    /// Directory created on the local side
    CreateLocalDir { path: Utf8PathBuf },

    /// Local file removed
    DeleteLocalFile { path: Utf8PathBuf },

    /// Local directory removed recursively
    DeleteLocalDir { path: Utf8PathBuf },

    /// Remote file or folder removed
    DeleteRemote { path: Utf8PathBuf },

    /// Remote object re-parented (and possibly renamed)
    MoveRemote { from: Utf8PathBuf, to: Utf8PathBuf },

    /// Remote object renamed in place
    RenameRemote { from: Utf8PathBuf, to: Utf8PathBuf },
}

impl SyncAction {
    /// Short label used in progress and summaries
    pub fn action_name(&self) -> &'static str {
        match self {
            SyncAction::CreateRemoteDir { .. } => "Mkdir remote",
            SyncAction::Upload { .. } => "Upload",
            SyncAction::UpdateRemote { .. } => "Update",
            SyncAction::Download { .. } => "Download",
            SyncAction::CreateLocalDir { .. } => "Mkdir local",
            SyncAction::DeleteLocalFile { .. } => "Delete local",
            SyncAction::DeleteLocalDir { .. } => "Delete local dir",
            SyncAction::DeleteRemote { .. } => "Delete remote",
            SyncAction::MoveRemote { .. } => "Move",
            SyncAction::RenameRemote { .. } => "Rename",
        }
    }

    /// Path the action targets (destination for moves and renames)
    pub fn path(&self) -> &Utf8Path {
        match self {
            SyncAction::CreateRemoteDir { path }
            | SyncAction::Upload { path, .. }
            | SyncAction::UpdateRemote { path, .. }
            | SyncAction::Download { path, .. }
            | SyncAction::CreateLocalDir { path }
            | SyncAction::DeleteLocalFile { path }
            | SyncAction::DeleteLocalDir { path }
            | SyncAction::DeleteRemote { path } => path,
            SyncAction::MoveRemote { to, .. } | SyncAction::RenameRemote { to, .. } => to,
        }
    }

    /// Check if this action removes data from either side
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            SyncAction::DeleteLocalFile { .. }
                | SyncAction::DeleteLocalDir { .. }
                | SyncAction::DeleteRemote { .. }
        )
    }
}
