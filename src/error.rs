//! Errors surfaced by the gateway's service layer.

use thiserror::Error;

use crate::admission::AdmissionReason;
use crate::upstream::ApiError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The caller was refused by admission control.
    #[error("rate limit exceeded for '{caller_id}' ({reason}); retry after {retry_after_secs}s")]
    RateLimitExceeded {
        caller_id: String,
        reason: AdmissionReason,
        retry_after_secs: u64,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    /// Request parameters were rejected before reaching the upstream.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::Api(e) => e.kind(),
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let limited = ServiceError::RateLimitExceeded {
            caller_id: "alice".into(),
            reason: AdmissionReason::BurstExhausted,
            retry_after_secs: 10,
        };
        assert_eq!(limited.kind(), "rate_limit_exceeded");
        assert!(limited.to_string().contains("burst_exhausted"));

        let api: ServiceError = ApiError::DeadlineExceeded {
            endpoint: "systems.json".into(),
            attempts: 2,
        }
        .into();
        assert_eq!(api.kind(), "api_deadline_exceeded");
        assert_eq!(api.to_string(), "deadline exceeded for systems.json after 2 attempt(s)");
    }
}
