//! Mapping of service errors onto HTTP responses.
//!
//! | Error                     | Status |
//! |---------------------------|--------|
//! | rate limit exceeded       | 429 + `Retry-After` |
//! | invalid input             | 400    |
//! | upstream failure / auth   | 502    |
//! | deadline exceeded         | 504    |
//! | client misconfiguration   | 500    |

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::ServiceError;
use crate::upstream::ApiError;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
}

pub fn status_for(error: &ServiceError) -> StatusCode {
    match error {
        ServiceError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::Api(ApiError::DeadlineExceeded { .. }) => StatusCode::GATEWAY_TIMEOUT,
        ServiceError::Api(ApiError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        ServiceError::Api(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = status_for(&self);
        let retry_after_secs = match &self {
            ServiceError::RateLimitExceeded { retry_after_secs, .. } => Some(*retry_after_secs),
            _ => None,
        };
        let upstream_status = match &self {
            ServiceError::Api(e) => e.status(),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            error: self.kind(),
            message: self.to_string(),
            retry_after_secs,
            upstream_status,
        };

        let mut response = (status, Json(body)).into_response();
        if let Some(secs) = retry_after_secs {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
