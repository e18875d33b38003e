//! Governor configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::queue::QueueConfig;
use super::retry::RetryPolicy;

/// Governor configuration
///
/// Defaults keep a low-volume client within the service's rate limits:
/// two requests in flight, one second between a slot freeing and the next
/// dispatch, five attempts per call starting at a one second backoff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Max concurrent remote calls
    #[serde(rename = "max-concurrency", default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Delay after a call settles before its slot dispatches again
    #[serde(rename = "request-delay-ms", default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Attempts per call, including the first
    #[serde(rename = "max-retry-attempts", default = "default_max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Backoff before the second attempt; doubles for each later one
    #[serde(rename = "retry-base-delay-ms", default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Upper bound on a dispatched call, retries included (unset = unbounded)
    #[serde(rename = "operation-timeout-ms", default, skip_serializing_if = "Option::is_none")]
    pub operation_timeout_ms: Option<u64>,
}

fn default_max_concurrency() -> usize {
    2
}

fn default_request_delay_ms() -> u64 {
    1000
}

fn default_max_retry_attempts() -> u32 {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    1000
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: default_max_concurrency(),
            request_delay_ms: default_request_delay_ms(),
            max_retry_attempts: default_max_retry_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            operation_timeout_ms: None,
        }
    }
}

impl GovernorConfig {
    /// Get the inter-dispatch delay as a Duration
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// Queue settings derived from this config
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig::new(self.max_concurrency, self.request_delay()).with_timeout(self.operation_timeout())
    }

    /// Retry settings derived from this config
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retry_attempts, Duration::from_millis(self.retry_base_delay_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GovernorConfig::default();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.request_delay_ms, 1000);
        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert_eq!(config.operation_timeout_ms, None);
    }

    #[test]
    fn test_derived_settings() {
        let config = GovernorConfig {
            max_concurrency: 4,
            request_delay_ms: 250,
            max_retry_attempts: 3,
            retry_base_delay_ms: 100,
            operation_timeout_ms: Some(30_000),
        };

        let queue = config.queue_config();
        assert_eq!(queue.max_concurrency, 4);
        assert_eq!(queue.request_delay, Duration::from_millis(250));
        assert_eq!(queue.operation_timeout, Some(Duration::from_secs(30)));

        let policy = config.retry_policy();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: GovernorConfig = serde_yaml::from_str("max-concurrency: 3\n").unwrap();
        assert_eq!(config.max_concurrency, 3);
        assert_eq!(config.request_delay_ms, 1000);
        assert_eq!(config.operation_timeout(), None);
    }
}
