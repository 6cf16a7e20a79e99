use std::future::Future;
use std::time::Duration;

use crate::config::UploadConfig;
use crate::error::UploadError;

/// Bounds for one upload: how many attempts, how long each may take and how
/// long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub attempt_timeout: Duration,
    pub delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn from_config(cfg: &UploadConfig) -> Self {
        Self {
            max_retries: cfg.max_retries,
            attempt_timeout: cfg.attempt_timeout(),
            delays: cfg.retry_delays(),
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Pause after the failed attempt with the given zero-based index. The
    /// last scheduled delay is reused once the schedule runs out.
    pub fn delay_after(&self, attempt_index: u32) -> Option<Duration> {
        self.delays
            .get(attempt_index as usize)
            .or_else(|| self.delays.last())
            .copied()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: UploadError },
}

/// Runs `op` until it succeeds or the policy is exhausted. Each attempt gets
/// its own deadline; an attempt that overruns it fails with
/// [`UploadError::Timeout`].
pub async fn execute_with_retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> RetryOutcome<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, UploadError>>,
{
    let total = policy.total_attempts();
    let mut attempt = 0;

    loop {
        let result = match tokio::time::timeout(policy.attempt_timeout, op(attempt)).await {
            Ok(result) => result,
            Err(_) => Err(UploadError::Timeout {
                after: policy.attempt_timeout,
            }),
        };

        let attempt_number = attempt + 1;
        let err = match result {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt_number,
                }
            }
            Err(err) => err,
        };

        if err.is_timeout() {
            tracing::warn!(
                timeout = ?policy.attempt_timeout,
                "upload timed out on attempt {attempt_number}/{total}"
            );
        } else {
            tracing::warn!(error = %err, "upload failed on attempt {attempt_number}/{total}");
        }

        if attempt_number >= total {
            return RetryOutcome::Exhausted {
                attempts: attempt_number,
                last_error: err,
            };
        }

        if let Some(delay) = policy.delay_after(attempt) {
            tracing::info!("retrying upload in {delay:?}...");
            tokio::time::sleep(delay).await;
        }
        attempt += 1;
    }
}
