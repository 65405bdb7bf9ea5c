//! Retry policy for backend calls
//!
//! Only errors the backend classifies as transient are retried, with
//! exponential backoff capped at `max_delay_ms`. Everything else surfaces on
//! the first failure.

use std::thread;
use std::time::Duration;

use crate::domain::ports::{BackendError, BackendErrorClass};
use crate::domain::value_objects::ResourceKey;
use crate::error::{Operation, ProvisionError};

/// Bounded exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per call, including the first one
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    sleep: fn(Duration),
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;
    pub const DEFAULT_BASE_DELAY_MS: u64 = 500;
    pub const DEFAULT_MAX_DELAY_MS: u64 = 8_000;

    pub fn new(max_attempts: u32, base_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            max_delay_ms,
            sleep: thread::sleep,
        }
    }

    /// Same budget, but backoff delays are not actually waited out
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            sleep: |_| {},
            ..Self::new(max_attempts, 0, 0)
        }
    }

    /// Whether another attempt is allowed after `attempts` failed ones
    pub fn should_retry(&self, attempts: u32) -> bool {
        attempts < self.max_attempts
    }

    /// Delay before retry number `retry` (0 is the first retry)
    pub fn delay_ms(&self, retry: u32) -> u64 {
        self.base_delay_ms
            .saturating_mul(2u64.saturating_pow(retry))
            .min(self.max_delay_ms)
    }

    /// Run `call` until it succeeds, fails permanently or the budget is spent.
    ///
    /// `on_retry` sees the attempt that just failed, the delay about to be
    /// waited and the error.
    pub fn run<T>(
        &self,
        mut call: impl FnMut() -> Result<T, BackendError>,
        mut on_retry: impl FnMut(u32, u64, &BackendError),
    ) -> Result<T, RetryFailure> {
        let mut attempts = 0;
        loop {
            attempts += 1;
            match call() {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && self.should_retry(attempts) => {
                    let delay = self.delay_ms(attempts - 1);
                    on_retry(attempts, delay, &error);
                    (self.sleep)(Duration::from_millis(delay));
                }
                Err(error) => return Err(RetryFailure { error, attempts }),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Self::DEFAULT_MAX_ATTEMPTS,
            Self::DEFAULT_BASE_DELAY_MS,
            Self::DEFAULT_MAX_DELAY_MS,
        )
    }
}

/// The error that ended a retried call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure {
    pub error: BackendError,
    pub attempts: u32,
}

impl RetryFailure {
    /// Classify into the engine's error taxonomy
    pub fn into_error(self, key: &ResourceKey, operation: Operation, existing: &str) -> ProvisionError {
        let RetryFailure { error, attempts } = self;
        if error.is_transient() {
            return ProvisionError::TransientBackend {
                key: key.clone(),
                operation,
                attempts,
                message: error.message,
            };
        }
        match error.class {
            BackendErrorClass::NameConflict => ProvisionError::Conflict {
                key: key.clone(),
                existing: existing.to_string(),
                message: error.message,
            },
            _ => ProvisionError::Backend {
                key: key.clone(),
                operation,
                message: error.to_string(),
            },
        }
    }
}
