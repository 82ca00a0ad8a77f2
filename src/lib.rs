//! Rate-limited, retrying gateway in front of a hosted log-search API.

pub mod admin;
pub mod admission;
pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod service;
pub mod upstream;

pub use admission::{AdmissionController, AdmissionDecision, AdmissionReason};
pub use config::schema::GatewayConfig;
pub use error::{ServiceError, ServiceResult};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use service::{LogSearchService, SearchParams};
pub use upstream::{ApiError, ResilientApiClient, SearchOptions, SearchResult};
