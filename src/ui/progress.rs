//! Progress reporting

use crate::diff::ReportStats;
use crate::types::SyncAction;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Progress reporter for sync runs
///
/// All methods take `&self` so one reporter can be shared with scan and
/// action callbacks through an `Arc`. Each scan phase gets its own spinner,
/// finished when the phase ends; actions are counted on a bar below them.
pub struct ProgressReporter {
    multi: MultiProgress,
    scan_bar: Mutex<ProgressBar>,
    action_bar: ProgressBar,
    steady_tick: bool,
    started_at: Instant,
}

impl ProgressReporter {
    /// Create a reporter drawing to stderr (hidden when stderr is not a terminal)
    pub fn new() -> Self {
        Self::with_target(ProgressDrawTarget::stderr(), true)
    }

    /// Create a reporter that never draws
    pub fn hidden() -> Self {
        Self::with_target(ProgressDrawTarget::hidden(), false)
    }

    fn with_target(target: ProgressDrawTarget, steady_tick: bool) -> Self {
        let multi = MultiProgress::with_draw_target(target);
        let action_bar = multi.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner} [{pos} actions] {msg}") {
            action_bar.set_style(style);
        }
        Self {
            multi,
            scan_bar: Mutex::new(ProgressBar::hidden()),
            action_bar,
            steady_tick,
            started_at: Instant::now(),
        }
    }

    fn current_scan(&self) -> ProgressBar {
        self.scan_bar
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Mark start of a scanning phase.
    pub fn start_scan(&self, label: &str) {
        let bar = self.multi.insert_before(&self.action_bar, ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            bar.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ "));
        }
        if self.steady_tick {
            bar.enable_steady_tick(Duration::from_millis(120));
        }
        bar.set_message(format!("Scanning {}...", label));
        *self.scan_bar.lock().unwrap_or_else(PoisonError::into_inner) = bar;
    }

    /// Update scanning progress counters.
    pub fn update_scan(&self, label: &str, dirs: u64, files: u64) {
        self.current_scan().set_message(format!(
            "Scanning {}... {} folders | {} files",
            label, dirs, files
        ));
    }

    /// Mark completion of a scanning phase, stopping its spinner.
    pub fn finish_scan(&self, label: &str, dirs: usize, files: usize) {
        self.current_scan().finish_with_message(format!(
            "Scanned {}: {} folders | {} files",
            label, dirs, files
        ));
    }

    /// Run `f` with every bar cleared, redrawing afterwards.
    ///
    /// Terminal prompts must go through here or the spinners overwrite them.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.multi.suspend(f)
    }

    /// Count one performed action and show it as current.
    pub fn action(&self, action: &SyncAction) {
        self.action_bar.inc(1);
        self.action_bar
            .set_message(format!("{} {}", action.action_name(), action.path()));
    }

    /// Number of actions counted so far.
    pub fn actions_seen(&self) -> u64 {
        self.action_bar.position()
    }

    /// Finalize the run display with a one-line summary.
    pub fn finish(&self, stats: &ReportStats) {
        let scan = self.current_scan();
        if !scan.is_finished() {
            scan.finish_and_clear();
        }
        self.action_bar.finish_with_message(format!(
            "Done in {:.1}s: {}",
            self.started_at.elapsed().as_secs_f64(),
            stats
        ));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
