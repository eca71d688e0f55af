//! Fixed-interval bounded retry for uploads.
//!
//! Failed attempts are retried after a constant pause until either the
//! operation succeeds, it fails with an error that reports itself as not
//! retryable, or the attempt ceiling is reached. The delay never grows
//! between attempts.
//!
//! # Example
//!
//! ```
//! use mapship_retry::{RetryConfig, RetryExecutor, Retryable};
//! use std::time::Duration;
//!
//! #[derive(Debug, PartialEq)]
//! struct Flaky;
//!
//! impl Retryable for Flaky {
//!     fn is_retryable(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let executor = RetryExecutor::new(RetryConfig {
//!     max_attempts: 5,
//!     interval: Duration::ZERO,
//! });
//! let result = executor.run(|attempt| if attempt < 3 { Err(Flaky) } else { Ok(attempt) });
//! assert_eq!(result, Ok(3));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Attempts made before giving up, counting the first one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Pause between two attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Retry configuration: an attempt ceiling and a fixed interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Fixed delay slept before every retry.
    #[serde(default = "default_interval")]
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_INTERVAL,
        }
    }
}

/// Errors that know whether repeating the operation can help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Runs a fallible operation under a [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    /// Create a new retry executor with the given configuration.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `operation` until it succeeds, fails permanently, or runs out
    /// of attempts.
    ///
    /// The operation receives the current attempt number (starting at 1).
    /// The last error is returned unchanged.
    pub fn run<T, E, F>(&self, operation: F) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut(u32) -> Result<T, E>,
    {
        self.run_with_hook(operation, |_, _, _| {})
    }

    /// Like [`RetryExecutor::run`], calling `on_retry(attempt, &error, delay)`
    /// before each pause so callers can log what is being retried.
    pub fn run_with_hook<T, E, F, H>(&self, mut operation: F, mut on_retry: H) -> Result<T, E>
    where
        E: Retryable,
        F: FnMut(u32) -> Result<T, E>,
        H: FnMut(u32, &E, Duration),
    {
        // A ceiling of zero still makes one attempt.
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt) {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !e.is_retryable() || attempt >= max_attempts {
                        return Err(e);
                    }

                    on_retry(attempt, &e, self.config.interval);
                    if !self.config.interval.is_zero() {
                        std::thread::sleep(self.config.interval);
                    }
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
