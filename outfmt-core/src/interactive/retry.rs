//! Blocking retry executor
//!
//! Unlike the retry recovery strategy, which only reports a plan, this
//! mechanism actually re-runs the operation, sleeping between attempts.
//! An optional confirmation hook lets an interactive session approve each
//! retry before it happens.

use crate::error::codes::ERR_PROCESSING_FAILURE;
use crate::error::{ErrorBuilder, OutputError};
use crate::recovery::backoff::ExponentialBackoff;
use crate::recovery::strategies::default_retry_predicate;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

type Predicate = Arc<dyn Fn(&OutputError) -> bool + Send + Sync>;
type ConfirmFn = Arc<dyn Fn(u32, Duration) -> bool + Send + Sync>;

pub struct RetryMechanism {
    max_attempts: u32,
    backoff: Option<ExponentialBackoff>,
    predicate: Predicate,
    confirm: Option<ConfirmFn>,
}

impl RetryMechanism {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: None,
            predicate: Arc::new(default_retry_predicate),
            confirm: None,
        }
    }

    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Retry any error, not just transient ones.
    pub fn retry_all(mut self) -> Self {
        self.predicate = Arc::new(|_| true);
        self
    }

    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&OutputError) -> bool + Send + Sync + 'static,
    {
        self.predicate = Arc::new(predicate);
        self
    }

    /// Called with the upcoming attempt number and delay before each retry;
    /// returning false stops retrying and surfaces the last error.
    pub fn with_confirmation<F>(mut self, confirm: F) -> Self
    where
        F: Fn(u32, Duration) -> bool + Send + Sync + 'static,
    {
        self.confirm = Some(Arc::new(confirm));
        self
    }

    /// Run `operation` up to `max_attempts` times. Non-retryable errors
    /// surface immediately; exhaustion wraps the last error.
    pub fn execute<T, F>(&self, mut operation: F) -> Result<T, OutputError>
    where
        F: FnMut() -> Result<T, OutputError>,
    {
        let mut last_err: Option<OutputError> = None;
        for attempt in 0..self.max_attempts {
            if attempt > 0 {
                let delay = self
                    .backoff
                    .map(|b| b.next_delay(attempt - 1))
                    .unwrap_or(Duration::ZERO);
                if let Some(confirm) = &self.confirm {
                    if !confirm(attempt + 1, delay) {
                        debug!(attempt, "retry declined");
                        break;
                    }
                }
                if !delay.is_zero() {
                    thread::sleep(delay);
                }
            }
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !(self.predicate)(&err) {
                        return Err(err);
                    }
                    debug!(attempt = attempt + 1, code = %err.code(), "attempt failed");
                    last_err = Some(err);
                }
            }
        }
        let attempts = self.max_attempts;
        let builder = ErrorBuilder::new(ERR_PROCESSING_FAILURE)
            .message(format!("failed after {attempts} attempts"));
        Err(match last_err {
            Some(cause) => builder.with_cause(cause).build(),
            None => builder.build(),
        })
    }
}
