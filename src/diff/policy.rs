//! Absence policy - What happens to an object present on only one side

use crate::types::{Side, SyncDirection, SyncError};
use camino::{Utf8Path, Utf8PathBuf};

/// File or directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    File,
    Dir,
}

/// An object that exists on one side only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Absence {
    pub path: Utf8PathBuf,
    pub kind: ObjectKind,
    /// Side that lacks the object
    pub missing: Side,
}

/// Outcome for a one-sided object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Create the object on the side that lacks it
    Create,
    /// Delete the object from the side that has it
    Delete,
}

/// Fixed decision for `direction`, or `None` when the user must be asked
///
/// | direction   | missing remote | missing local |
/// |-------------|----------------|---------------|
/// | pushOnly    | create         | delete        |
/// | pullOnly    | delete         | create        |
/// | mirror      | create         | create        |
/// | interactive | ask            | ask           |
pub fn policy_for(direction: SyncDirection, missing: Side) -> Option<Decision> {
    match (direction, missing) {
        (SyncDirection::PushOnly, Side::Remote) => Some(Decision::Create),
        (SyncDirection::PushOnly, Side::Local) => Some(Decision::Delete),
        (SyncDirection::PullOnly, Side::Local) => Some(Decision::Create),
        (SyncDirection::PullOnly, Side::Remote) => Some(Decision::Delete),
        (SyncDirection::Mirror, _) => Some(Decision::Create),
        (SyncDirection::Interactive, _) => None,
    }
}

/// Check if created directories are deep-copied by the restore pass
/// instead of being walked tier by tier
pub fn defers_to_restore(direction: SyncDirection) -> bool {
    matches!(direction, SyncDirection::Mirror | SyncDirection::Interactive)
}

/// Answers the per-object questions of the interactive direction
pub trait Decider {
    /// Create or delete a one-sided object
    fn decide(&mut self, absence: &Absence) -> Result<Decision, SyncError>;

    /// Copy one object during the restore pass; declining a directory skips its subtree
    fn confirm_restore(&mut self, path: &Utf8Path, kind: ObjectKind) -> Result<bool, SyncError>;
}

/// Decider that gives the same answers every time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDecider {
    pub decision: Decision,
    pub restore: bool,
}

impl FixedDecider {
    /// Always create, always restore
    pub fn always_create() -> Self {
        Self {
            decision: Decision::Create,
            restore: true,
        }
    }

    /// Always delete
    pub fn always_delete() -> Self {
        Self {
            decision: Decision::Delete,
            restore: false,
        }
    }
}

impl Decider for FixedDecider {
    fn decide(&mut self, _absence: &Absence) -> Result<Decision, SyncError> {
        Ok(self.decision)
    }

    fn confirm_restore(&mut self, _path: &Utf8Path, _kind: ObjectKind) -> Result<bool, SyncError> {
        Ok(self.restore)
    }
}
