//! Explicit retry policy for network operations
//!
//! Retries apply to read and list calls only. Tag, branch, and commit
//! creation are never retried: their non-idempotence is handled by checking
//! for existence before creating, not by replaying the create.

use crate::core::config::RetrySettings;
use crate::core::error::ApiError;
use log::warn;
use std::time::Duration;

/// Bounded retry with fixed-base backoff: attempt N sleeps N * base.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
  max_attempts: u32,
  base_interval: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_interval: Duration::from_secs(5),
    }
  }
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, base_interval: Duration) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      base_interval,
    }
  }

  pub fn from_settings(settings: &RetrySettings) -> Self {
    Self::new(settings.max_attempts, Duration::from_secs(settings.base_interval_secs))
  }

  /// A policy that never sleeps and never retries; for tests and for call
  /// sites that pre-check existence themselves.
  pub fn none() -> Self {
    Self::new(1, Duration::ZERO)
  }

  /// Run `f`, retrying while it fails with a retryable error and attempts
  /// remain. Non-retryable errors are returned immediately.
  pub fn run<T, F>(&self, operation: &str, mut f: F) -> Result<T, ApiError>
  where
    F: FnMut() -> Result<T, ApiError>,
  {
    let mut attempt = 1;

    loop {
      match f() {
        Ok(value) => return Ok(value),
        Err(err) if err.retryable() && attempt < self.max_attempts => {
          let delay = self.base_interval * attempt;
          warn!(
            "'{}' failed (attempt {}/{}), retrying in {:?}: {}",
            operation, attempt, self.max_attempts, delay, err
          );
          std::thread::sleep(delay);
          attempt += 1;
        }
        Err(err) if err.retryable() => {
          return Err(ApiError::RetriesExhausted {
            operation: operation.to_string(),
            attempts: self.max_attempts,
            last: err.to_string(),
          });
        }
        Err(err) => return Err(err),
      }
    }
  }
}
