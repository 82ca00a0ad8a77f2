//! Upstream log-search API.
//!
//! # Data Flow
//! ```text
//! search_logs(query, options)
//!     → types.rs (resolve defaults: last hour, limit 1..=1000)
//!     → client.rs (GET with token header, retry with backoff)
//!     → types.rs (normalize payload into SearchPage)
//!     → SearchResult::Found / SearchResult::Failed
//! ```
//!
//! # Design Decisions
//! - Search failures are returned as data so callers can render them
//! - Listing endpoints return `ApiResult` since there is nothing to normalize

pub mod client;
pub mod types;

pub use client::{ResilientApiClient, GROUPS_ENDPOINT, SEARCH_ENDPOINT, SYSTEMS_ENDPOINT};
pub use types::{
    clamp_limit, ApiError, ApiResult, ConnectivityReport, LogEvent, LogGroup, LogSystem,
    SearchOptions, SearchPage, SearchRequest, SearchResult, TimeRange, DEFAULT_LOOKBACK,
    DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT, MIN_SEARCH_LIMIT,
};
