//! Run-level retry on transient failures
//!
//! There is no partial progress to resume: a failed attempt is abandoned and
//! the next one starts over from scanning both trees.

use crate::types::SyncError;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

/// How often and how patiently a whole run is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Fixed pause between attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retry
    #[must_use]
    pub fn once() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::ZERO,
        }
    }
}

/// Run `attempt` until it succeeds, fails permanently, or the budget runs out
///
/// The closure receives the 1-based attempt number. Only errors classified
/// as transient are retried; anything else is returned as is.
pub fn run_with_retry<T, F>(policy: &RetryPolicy, mut attempt: F) -> Result<T, SyncError>
where
    F: FnMut(u32) -> Result<T, SyncError>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        match attempt(attempts) {
            Ok(value) => {
                if attempts > 1 {
                    info!("Run succeeded after {} attempts", attempts);
                }
                return Ok(value);
            }
            Err(err) if err.is_transient() => {
                if attempts >= max_attempts {
                    return Err(SyncError::RetriesExhausted {
                        attempts: attempts as usize,
                        last: Box::new(err),
                    });
                }
                warn!(
                    "Network error (attempt {}/{}): {}. Retrying in {:?}...",
                    attempts, max_attempts, err, policy.delay
                );
                thread::sleep(policy.delay);
            }
            Err(err) => return Err(err),
        }
    }
}
