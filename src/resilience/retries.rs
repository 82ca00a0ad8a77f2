//! Retry policy.
//!
//! # Responsibilities
//! - Decide whether a failed attempt is worth repeating
//! - Produce the delay before the next attempt
//!
//! # Design Decisions
//! - Every request we send is a GET, so idempotency is never in question
//! - Transport errors and non-2xx statuses are retried uniformly, except
//!   401/403 which fail fast unless `retry_auth_failures` is set
//! - A successful response with no results is not a failure

use std::time::Duration;

use reqwest::StatusCode;

use crate::config::ApiConfig;
use crate::resilience::backoff::{apply_jitter, calculate_backoff};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, first try included.
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub jitter_ratio: f64,
    pub retry_auth_failures: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&ApiConfig::default())
    }
}

impl From<&ApiConfig> for RetryPolicy {
    fn from(config: &ApiConfig) -> Self {
        Self {
            max_attempts: config.max_retries.max(1),
            base_delay_ms: config.base_delay_ms,
            max_delay_ms: config.max_delay_ms,
            jitter_ratio: config.jitter_ratio,
            retry_auth_failures: config.retry_auth_failures,
        }
    }
}

impl RetryPolicy {
    /// Whether a response with this status should be attempted again.
    pub fn is_retryable_status(&self, status: StatusCode) -> bool {
        if status.is_success() {
            return false;
        }
        if is_auth_failure(status) {
            return self.retry_auth_failures;
        }
        true
    }

    /// Delay after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        apply_jitter(
            calculate_backoff(attempt, self.base_delay_ms, self.max_delay_ms),
            self.jitter_ratio,
        )
    }
}

/// 401 and 403: the credential was refused.
pub fn is_auth_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_errors_are_retryable() {
        let policy = RetryPolicy::default();
        assert!(policy.is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(policy.is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(policy.is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(policy.is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!policy.is_retryable_status(StatusCode::OK));
    }

    #[test]
    fn test_auth_failures_fail_fast_by_default() {
        let mut policy = RetryPolicy::default();
        assert!(!policy.is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!policy.is_retryable_status(StatusCode::FORBIDDEN));

        policy.retry_auth_failures = true;
        assert!(policy.is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn test_policy_from_config() {
        let config = ApiConfig {
            max_retries: 0,
            base_delay_ms: 50,
            ..ApiConfig::default()
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.delay_for(2), Duration::from_millis(100));
    }
}
