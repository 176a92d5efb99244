//! Command runners

mod partial;
mod retry;
mod sync;

pub use partial::run_partial;
pub use retry::{run_with_retry, RetryPolicy};
pub use sync::run_full;

use crate::config::{Config, SyncMode};
use crate::diff::{Decider, SyncReport};
use crate::store::RemoteStore;
use crate::types::SyncError;
use crate::ui::ProgressReporter;
use std::sync::Arc;

/// Run one attempt in the configured mode
pub fn run(
    config: &Config,
    remote: &mut dyn RemoteStore,
    decider: Option<&mut dyn Decider>,
    reporter: Arc<ProgressReporter>,
) -> Result<SyncReport, SyncError> {
    match config.mode {
        SyncMode::Full => run_full(config, remote, decider, reporter),
        SyncMode::PartialUpdate => run_partial(config, remote, reporter),
    }
}
