//! Retry with exponential backoff around a single remote call

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::remote::RemoteError;

/// Check run before every attempt; an `Err` fails the call without invoking it
pub type Precondition = Arc<dyn Fn() -> Result<(), RemoteError> + Send + Sync>;

/// Attempt budget and backoff base for one call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (always >= 1)
    pub max_attempts: u32,

    /// Wait before the second attempt
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Wait after the failed attempt at `attempt` (0-indexed): `base * 2^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(1000))
    }
}

/// Runs an operation until it succeeds, fails fatally, or runs out of attempts
///
/// Retriable failures are followed by a sleep local to this call, so other
/// in-flight calls keep running. On exhaustion the last error is returned as-is.
#[derive(Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    precondition: Option<Precondition>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("precondition", &self.precondition.is_some())
            .finish()
    }
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            precondition: None,
        }
    }

    /// Attach a precondition checked before each attempt
    pub fn with_precondition(mut self, precondition: Precondition) -> Self {
        self.precondition = Some(precondition);
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run `operation` under this executor's policy
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let max_attempts = self.policy.max_attempts;
        let mut attempt = 0u32;

        loop {
            if let Some(check) = &self.precondition {
                check().inspect_err(|e| debug!(error = %e, "RetryExecutor::run: precondition failed"))?;
            }

            let err = match operation().await {
                Ok(value) => {
                    debug!(attempt, "RetryExecutor::run: success");
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_retryable() {
                debug!(attempt, error = %err, "RetryExecutor::run: fatal error, not retrying");
                return Err(err);
            }

            if attempt + 1 >= max_attempts {
                error!(max_attempts, error = %err, "All retry attempts failed for a retriable error");
                return Err(err);
            }

            let backoff = self.policy.backoff(attempt);
            warn!(
                attempt = attempt + 1,
                max_attempts,
                backoff_ms = backoff.as_millis() as u64,
                error = %err,
                "Service unavailable, retrying after backoff"
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// Retry `operation` with the given attempt budget and backoff base
pub async fn with_retry<T, F, Fut>(operation: F, max_attempts: u32, base_delay: Duration) -> Result<T, RemoteError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
{
    RetryExecutor::new(RetryPolicy::new(max_attempts, base_delay))
        .run(operation)
        .await
}
