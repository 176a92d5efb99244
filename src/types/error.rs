//! Error types for drivesync

use camino::Utf8PathBuf;
use thiserror::Error;

/// Error types for drivesync operations
#[derive(Debug, Error)]
pub enum SyncError {
    /// Standard IO error (automatically converted via #[from])
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration or command-line usage
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error (logic checks)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Connectivity loss, transport timeout, or auth refresh failing for lack of network
    #[error("Network error: {0}")]
    Network(String),

    /// The remote service rejected or failed a request
    #[error("Remote error: {0}")]
    Remote(String),

    /// Remote object does not exist (anymore)
    #[error("Remote object not found: {id}")]
    NotFound { id: String },

    /// Local path is not valid UTF-8 and cannot be mapped to a remote name
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8Path(std::path::PathBuf),

    /// Local object expected by an operation is missing
    #[error("Local path not found: {path}")]
    LocalNotFound { path: Utf8PathBuf },

    /// JSON decode/encode failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Run-level retry budget used up on transient failures
    #[error("Gave up after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: usize,
        last: Box<SyncError>,
    },
}

/// Closed classification used by the run-level retry/abort decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Retry the whole run after a backoff
    Transient,
    /// Fail fast before any mutation, never retried
    Usage,
    /// Remote data anomaly; callers log and continue where tolerated
    Anomaly,
    /// Abort the run immediately
    Fatal,
}

impl SyncError {
    /// Classify this error for the retry loop
    pub fn class(&self) -> ErrorClass {
        match self {
            SyncError::Network(_) => ErrorClass::Transient,
            SyncError::Config(_) => ErrorClass::Usage,
            SyncError::NotFound { .. } => ErrorClass::Anomaly,
            SyncError::Io(_)
            | SyncError::Validation(_)
            | SyncError::Remote(_)
            | SyncError::NonUtf8Path(_)
            | SyncError::LocalNotFound { .. }
            | SyncError::Json(_)
            | SyncError::RetriesExhausted { .. } => ErrorClass::Fatal,
        }
    }

    /// Check if this error should trigger a run-level retry
    pub fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }

    /// Check if this error is a usage/configuration error
    pub fn is_usage_error(&self) -> bool {
        self.class() == ErrorClass::Usage
    }

    /// Check if this error reports a missing remote object
    pub fn is_not_found(&self) -> bool {
        matches!(self, SyncError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error as IoError, ErrorKind};

    #[test]
    fn test_io_error_automatic_conversion() {
        let io_error = IoError::new(ErrorKind::NotFound, "file not found");
        let err: SyncError = io_error.into();

        assert!(matches!(err, SyncError::Io(_)));
        assert!(err.to_string().contains("IO error"));
        assert_eq!(err.class(), ErrorClass::Fatal);
    }

    #[test]
    fn test_io_error_from_function() {
        fn returns_io_error() -> Result<(), SyncError> {
            let _file = std::fs::File::open("/nonexistent/path/file.txt")?;
            Ok(())
        }

        let result = returns_io_error();
        assert!(matches!(result.unwrap_err(), SyncError::Io(_)));
    }

    #[test]
    fn test_network_error_is_transient() {
        let error = SyncError::Network("connection reset".to_string());
        assert!(error.is_transient());
        assert!(!error.is_usage_error());
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn test_config_error_is_usage() {
        let error = SyncError::Config("bad ignore spec".to_string());
        assert!(error.is_usage_error());
        assert!(!error.is_transient());
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_not_found_is_anomaly() {
        let error = SyncError::NotFound {
            id: "abc".to_string(),
        };
        assert!(error.is_not_found());
        assert_eq!(error.class(), ErrorClass::Anomaly);
        assert!(error.to_string().contains("abc"));
    }

    #[test]
    fn test_remote_failure_is_fatal_not_transient() {
        let error = SyncError::Remote("quota exceeded".to_string());
        assert_eq!(error.class(), ErrorClass::Fatal);
        assert!(!error.is_transient());
    }

    #[test]
    fn test_retries_exhausted_message_includes_last_error() {
        let error = SyncError::RetriesExhausted {
            attempts: 3,
            last: Box::new(SyncError::Network("timeout".to_string())),
        };
        let msg = error.to_string();
        assert!(msg.contains("3 attempt"));
        assert!(msg.contains("timeout"));
        assert!(!error.is_transient());
    }

    #[test]
    fn test_result_propagation() {
        fn inner_function() -> Result<(), SyncError> {
            Err(SyncError::Config("test error".to_string()))
        }

        fn outer_function() -> Result<(), SyncError> {
            inner_function()?;
            Ok(())
        }

        assert!(matches!(outer_function().unwrap_err(), SyncError::Config(_)));
    }
}
