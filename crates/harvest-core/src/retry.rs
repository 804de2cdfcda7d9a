//! Capped retry with exponential backoff for uploads.
//!
//! Wraps any [`Uploader`] so that transient failures (see
//! [`AppError::is_retryable`]) are retried a bounded number of times.
//! The default policy makes a single attempt, so wrapping is free when
//! retries are not wanted. A failure that outlives the policy is always
//! returned to the caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use harvest_core::retry::{RetryPolicy, RetryingUploader};
//! use harvest_core::traits::NullUploader;
//!
//! let policy = RetryPolicy::new(3).with_base_delay(Duration::from_millis(500));
//! let uploader = RetryingUploader::new(NullUploader, policy);
//! ```

use std::time::Duration;

use crate::error::AppError;
use crate::models::UploadReceipt;
use crate::traits::Uploader;

/// How many times to try an upload and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than 1.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each further one.
    pub base_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay after the given failed attempt (1-based).
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    /// One attempt, no retry.
    fn default() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// An [`Uploader`] wrapper that retries transient failures.
#[derive(Debug, Clone)]
pub struct RetryingUploader<U> {
    inner: U,
    policy: RetryPolicy,
}

impl<U: Uploader> RetryingUploader<U> {
    pub fn new(inner: U, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &U {
        &self.inner
    }
}

impl<U: Uploader> Uploader for RetryingUploader<U> {
    async fn upload(
        &self,
        path: &str,
        content: &str,
        message: &str,
    ) -> Result<UploadReceipt, AppError> {
        let mut attempt = 1;
        loop {
            match self.inner.upload(path, content, message).await {
                Ok(receipt) => return Ok(receipt),
                Err(e) if e.is_retryable() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.delay_after(attempt);
                    tracing::warn!(
                        %path,
                        attempt,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Upload failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
