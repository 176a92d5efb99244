//! Reconciliation engine - Comparison, absence policy, merge and restore

mod compare;
mod policy;
mod reconcile;
mod report;
mod restore;

pub use compare::{compare_files, Recency};
pub use policy::{defers_to_restore, policy_for, Absence, Decider, Decision, FixedDecider, ObjectKind};
pub use reconcile::Reconciler;
pub use report::{ReportStats, SyncReport};
pub use restore::{RestorePass, RestoreTarget};
