//! Retry policy combinator
//!
//! One policy drives every outbound call: each attempt runs under its own
//! timeout, failed attempts wait `backoff * attempt` before the next one,
//! and a cancel signal aborts both the in-flight attempt and any pending
//! wait.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use finlit_config::{ChatConfig, ClientConfig};
use finlit_core::CancelSignal;

/// Why an attempt ended without producing a result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptAborted {
    /// The per-attempt timeout elapsed
    TimedOut(Duration),
    /// The caller cancelled
    Cancelled,
}

/// Bounded retry with linear backoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts per logical request, including the first. Never zero.
    pub max_attempts: u32,
    /// Timeout for each individual attempt
    pub timeout: Duration,
    /// Linear backoff unit
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_client_config(&ClientConfig::default())
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, timeout: Duration, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            timeout,
            backoff,
        }
    }

    /// Policy for general API calls
    pub fn from_client_config(config: &ClientConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.backoff_ms),
        )
    }

    /// Policy for the chat path
    pub fn from_chat_config(config: &ChatConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.timeout_ms),
            Duration::from_millis(config.backoff_ms),
        )
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Wait inserted after failed attempt number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff * attempt
    }

    /// Worst-case wall time: every attempt times out and every wait is taken
    pub fn worst_case(&self) -> Duration {
        let waits: Duration = (1..self.max_attempts).map(|a| self.delay_for(a)).sum();
        self.timeout * self.max_attempts + waits
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or
    /// attempts run out.
    ///
    /// `op` receives the 1-based attempt number. The last observed error is
    /// returned on exhaustion. Timeouts and cancellation reach the caller's
    /// error type through `From<AttemptAborted>`, and `is_retryable` decides
    /// whether a timeout is worth retrying like any other error.
    pub async fn run<T, E, F, Fut, R>(
        &self,
        cancel: &CancelSignal,
        mut op: F,
        is_retryable: R,
    ) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: Fn(&E) -> bool,
        E: From<AttemptAborted> + Display,
    {
        let mut attempt = 1;

        loop {
            if cancel.is_cancelled() {
                return Err(AttemptAborted::Cancelled.into());
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(AttemptAborted::Cancelled.into()),
                result = tokio::time::timeout(self.timeout, op(attempt)) => match result {
                    Ok(result) => result,
                    Err(_) => Err(AttemptAborted::TimedOut(self.timeout).into()),
                },
            };

            let error = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if attempt >= self.max_attempts || cancel.is_cancelled() || !is_retryable(&error) {
                return Err(error);
            }

            let delay = self.delay_for(attempt);
            tracing::warn!(
                attempt,
                max_attempts = self.max_attempts,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Request failed, retrying"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(AttemptAborted::Cancelled.into()),
                _ = tokio::time::sleep(delay) => {},
            }

            attempt += 1;
        }
    }
}
