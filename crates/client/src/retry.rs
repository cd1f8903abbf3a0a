use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use configs::RetryConfig;

use crate::observability::REQUEST_RETRIES_TOTAL;

/// Errors that know whether repeating the same request could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    enabled: bool,
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        backoff_base: Duration,
        backoff_max: Duration,
        enabled: bool,
    ) -> Self {
        Self {
            max_attempts,
            backoff_base,
            backoff_max,
            enabled,
        }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(
            cfg.max_attempts.max(1),
            Duration::from_millis(cfg.backoff_base_ms),
            Duration::from_millis(cfg.backoff_max_ms),
            cfg.enabled,
        )
    }

    /// Exactly one attempt per request.
    pub fn disabled() -> Self {
        Self::new(1, Duration::ZERO, Duration::ZERO, false)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn max_attempts(&self) -> u32 {
        if self.enabled {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    /// `base * 2^(attempt-1)`, capped at `backoff_max`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2_u32.saturating_pow(attempt - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }

    pub async fn wait_before_retry(&self, attempt: u32) {
        if !self.enabled || attempt == 0 {
            return;
        }
        let backoff_duration = self.backoff(attempt);
        debug!(?backoff_duration, attempt, "retrying");
        sleep(backoff_duration).await;
    }

    pub fn should_retry<E: Retryable + std::fmt::Display>(&self, attempt: u32, error: &E) -> bool {
        if !self.enabled {
            return false;
        }

        if attempt >= self.max_attempts {
            debug!(max_attempts = self.max_attempts, "max retry attempts reached");
            return false;
        }

        if error.is_retryable() {
            debug!(%error, "error is retryable");
            true
        } else {
            debug!(%error, "error is not retryable");
            false
        }
    }
}

pub async fn retry_with_policy<F, Fut, T, E>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            REQUEST_RETRIES_TOTAL.inc();
            policy.wait_before_retry(attempt).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(retries = attempt, "operation succeeded after retries");
                }
                return Ok(result);
            }
            Err(error) => {
                attempt += 1;
                if attempt < policy.max_attempts() && policy.should_retry(attempt, &error) {
                    warn!(attempt, %error, "attempt failed, will retry");
                    continue;
                }
                return Err(error);
            }
        }
    }
}
