//! Configuration management
//!
//! Values come from the command line and, optionally, a TOML file given with
//! `--config`. Command-line values win; ignore lists from both are combined.
//! Everything is validated before any store is touched.

use crate::commands::RetryPolicy;
use crate::store::DEFAULT_PAGE_SIZE;
use crate::types::{normalize_rel_path, ActionBatch, IgnoreRule, SyncDirection, SyncError};
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default file holding the persisted remote store
pub const DEFAULT_REMOTE_STORE: &str = "drivesync-remote.json";

/// Full reconciliation or replay of an explicit action batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SyncMode {
    /// Scan both trees and reconcile them
    #[default]
    #[value(name = "full")]
    Full,

    /// Apply the batch given with --actions_json, without scanning
    #[value(name = "partial_update")]
    PartialUpdate,
}

/// Command-line arguments
#[derive(Parser, Debug, Clone)]
#[command(
    name = "drivesync",
    version,
    about = "Reconcile a local directory with a remote folder hierarchy"
)]
pub struct Cli {
    /// Local directory to synchronize
    #[arg(value_name = "LOCAL_PATH")]
    pub local_path: PathBuf,

    /// Remote folder, relative to the store root (created if missing)
    #[arg(value_name = "REMOTE_PATH")]
    pub remote_path: String,

    /// Sync into a fresh `<name>_<timestamp>` folder if REMOTE_PATH already exists
    #[arg(short = 'n', long)]
    pub new: bool,

    /// Which side is authoritative for objects present on one side only
    #[arg(long = "sync-direction", value_enum)]
    pub sync_direction: Option<SyncDirection>,

    /// Exclusion, as path=<rel>,type=<singleFile|allFiles|wholeSubtree> (repeatable)
    #[arg(long = "ignore", value_name = "SPEC")]
    pub ignore: Vec<String>,

    /// Full sync or partial update
    #[arg(long, value_enum, default_value_t = SyncMode::Full)]
    pub mode: SyncMode,

    /// Action batch for partial_update mode
    #[arg(long = "actions_json", alias = "actions-json", value_name = "JSON")]
    pub actions_json: Option<String>,

    /// JSON file holding the remote store
    #[arg(long = "remote-store", value_name = "FILE")]
    pub remote_store: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Attempts per run on network errors
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long = "retry-delay", value_name = "SECS")]
    pub retry_delay: Option<u64>,

    /// Children requested per remote listing page
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<usize>,

    /// Also append logs to this file
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Debug-level logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Settings accepted from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub remote_store: Option<PathBuf>,
    pub retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub page_size: Option<usize>,
    pub log_file: Option<PathBuf>,
    pub sync_direction: Option<SyncDirection>,
    /// Same syntax as `--ignore`
    pub ignore: Vec<String>,
}

impl FileConfig {
    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let content = fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            SyncError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}

/// Global configuration for drivesync
#[derive(Debug, Clone)]
pub struct Config {
    /// Local sync root
    pub local_root: PathBuf,

    /// Remote folder path relative to the store root
    pub remote_path: String,

    /// Sync into a fresh timestamped sibling when the remote folder exists
    pub create_new: bool,

    /// Absence policy
    pub direction: SyncDirection,

    /// Exclusions applied to both sides
    pub ignore_rules: Vec<IgnoreRule>,

    pub mode: SyncMode,

    /// Action batch (partial_update mode only)
    pub actions: Option<ActionBatch>,

    /// JSON file backing the remote store
    pub remote_store: PathBuf,

    /// Run-level retry on network errors
    pub retry: RetryPolicy,

    /// Remote listing page size
    pub page_size: usize,

    pub log_file: Option<PathBuf>,

    pub verbose: bool,
}

impl Config {
    /// Configuration with defaults for everything but the two roots
    pub fn new(local_root: impl Into<PathBuf>, remote_path: impl Into<String>) -> Self {
        Self {
            local_root: local_root.into(),
            remote_path: remote_path.into(),
            create_new: false,
            direction: SyncDirection::default(),
            ignore_rules: Vec::new(),
            mode: SyncMode::Full,
            actions: None,
            remote_store: PathBuf::from(DEFAULT_REMOTE_STORE),
            retry: RetryPolicy::default(),
            page_size: DEFAULT_PAGE_SIZE,
            log_file: None,
            verbose: false,
        }
    }

    /// Validate configuration
    ///
    /// Rejects contradictory or unusable settings before anything is mutated.
    pub fn validate(&self) -> Result<(), SyncError> {
        if !self.local_root.exists() {
            return Err(SyncError::Config(format!(
                "Local path does not exist: {}",
                self.local_root.display()
            )));
        }
        if !self.local_root.is_dir() {
            return Err(SyncError::Config(format!(
                "Local path is not a directory: {}",
                self.local_root.display()
            )));
        }

        if self.create_new {
            if self.direction == SyncDirection::PullOnly {
                return Err(SyncError::Config(
                    "--new cannot be combined with pullOnly: an empty new remote folder would delete every local file"
                        .to_string(),
                ));
            }
            if self.mode == SyncMode::PartialUpdate {
                return Err(SyncError::Config(
                    "--new cannot be combined with partial_update".to_string(),
                ));
            }
            if normalize_rel_path(&self.remote_path).as_str().is_empty() {
                return Err(SyncError::Config(
                    "--new needs a named remote folder, not the store root".to_string(),
                ));
            }
        }

        match (self.mode, &self.actions) {
            (SyncMode::PartialUpdate, None) => {
                return Err(SyncError::Config(
                    "partial_update mode requires --actions_json".to_string(),
                ))
            }
            (SyncMode::Full, Some(_)) => {
                return Err(SyncError::Config(
                    "--actions_json is only used with --mode partial_update".to_string(),
                ))
            }
            _ => {}
        }

        if self.page_size == 0 {
            return Err(SyncError::Config("Page size must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(SyncError::Config("Retries must be at least 1".to_string()));
        }

        Ok(())
    }
}

impl TryFrom<Cli> for Config {
    type Error = SyncError;

    /// Merge the CLI with the optional config file and validate the result
    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let ignore_rules = file
            .ignore
            .iter()
            .chain(cli.ignore.iter())
            .map(|spec| spec.parse::<IgnoreRule>())
            .collect::<Result<Vec<_>, _>>()?;

        let actions = cli
            .actions_json
            .as_deref()
            .map(ActionBatch::from_json)
            .transpose()?;

        let defaults = RetryPolicy::default();
        let retry = RetryPolicy {
            max_attempts: cli.retries.or(file.retries).unwrap_or(defaults.max_attempts),
            delay: cli
                .retry_delay
                .or(file.retry_delay_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.delay),
        };

        let config = Config {
            local_root: cli.local_path,
            remote_path: cli.remote_path,
            create_new: cli.new,
            direction: cli.sync_direction.or(file.sync_direction).unwrap_or_default(),
            ignore_rules,
            mode: cli.mode,
            actions,
            remote_store: cli
                .remote_store
                .or(file.remote_store)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REMOTE_STORE)),
            retry,
            page_size: cli.page_size.or(file.page_size).unwrap_or(DEFAULT_PAGE_SIZE),
            log_file: cli.log_file.or(file.log_file),
            verbose: cli.verbose,
        };

        config.validate()?;
        Ok(config)
    }
}
