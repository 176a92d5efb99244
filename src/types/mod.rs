//! Core type definitions for drivesync

mod action;
mod batch;
mod entry;
mod error;
mod ignore;
mod tree;

pub use action::{Side, SyncAction, SyncDirection};
pub use batch::ActionBatch;
pub use entry::{DirEntry, FileEntry};
pub use error::{ErrorClass, SyncError};
pub use self::ignore::{IgnoreRule, IgnoreScope};
pub use tree::{checked_rel_path, depth_of, normalize_rel_path, Forest, TreeNode};
