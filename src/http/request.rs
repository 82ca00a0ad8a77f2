//! Inbound request identity.
//!
//! # Responsibilities
//! - Decide which caller a request is charged to for admission control
//!
//! # Design Decisions
//! - An explicit `x-caller-id` header wins
//! - Otherwise the peer IP address is used, so unidentified callers still get
//!   separate budgets per host
//! - Extraction never fails; requests without either share one bucket

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;

/// Header naming the caller an inbound request should be charged to.
pub const X_CALLER_ID: &str = "x-caller-id";

/// Bucket used when neither the header nor the peer address is available.
pub const ANONYMOUS_CALLER: &str = "anonymous";

const MAX_CALLER_ID_LEN: usize = 128;

/// The caller identity for admission control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_parts(parts: &Parts) -> Self {
        let from_header = parts
            .headers
            .get(X_CALLER_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && v.len() <= MAX_CALLER_ID_LEN);
        if let Some(id) = from_header {
            return Self(id.to_string());
        }

        parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| Self(addr.ip().to_string()))
            .unwrap_or_else(|| Self(ANONYMOUS_CALLER.to_string()))
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerId {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_header_takes_precedence() {
        let mut parts = parts(Request::builder().header(X_CALLER_ID, " team-a "));
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 5000))));
        assert_eq!(CallerId::from_parts(&parts).as_str(), "team-a");
    }

    #[test]
    fn test_falls_back_to_peer_ip() {
        let mut parts = parts(Request::builder());
        parts
            .extensions
            .insert(ConnectInfo(SocketAddr::from(([10, 0, 0, 1], 5000))));
        assert_eq!(CallerId::from_parts(&parts).as_str(), "10.0.0.1");
    }

    #[test]
    fn test_oversized_or_missing_identity() {
        let long = "x".repeat(MAX_CALLER_ID_LEN + 1);
        let parts = parts(Request::builder().header(X_CALLER_ID, long));
        assert_eq!(CallerId::from_parts(&parts).as_str(), ANONYMOUS_CALLER);
    }
}
