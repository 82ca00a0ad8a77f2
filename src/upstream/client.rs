//! HTTP client for the upstream log-search API.
//!
//! # Responsibilities
//! - Authenticate every request with the configured token header
//! - Retry failed attempts with exponential backoff
//! - Normalize search payloads into [`SearchPage`]
//! - Report search failures as values, never as panics or raw transport errors
//!
//! # Design Decisions
//! - One `reqwest::Client` per instance; clones share its connection pool
//! - Time defaults are computed from the injected [`Clock`], not the OS clock
//! - The retry loop lives in one place and serves every endpoint

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderName, HeaderValue, ACCEPT};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use crate::clock::{Clock, SystemClock};
use crate::config::ApiConfig;
use crate::observability::metrics;
use crate::resilience::retries::is_auth_failure;
use crate::resilience::{RequestContext, RetryPolicy};
use crate::upstream::types::{
    ApiError, ApiResult, ConnectivityReport, LogGroup, LogSystem, RawSearchResponse, SearchOptions,
    SearchPage, SearchRequest, SearchResult,
};

pub const SEARCH_ENDPOINT: &str = "events/search.json";
pub const SYSTEMS_ENDPOINT: &str = "systems.json";
pub const GROUPS_ENDPOINT: &str = "groups.json";

/// Why a single attempt did not produce a value.
#[derive(Debug)]
enum AttemptFailure {
    Transport(String),
    Timeout,
    Status(StatusCode),
    Decode(String),
}

impl AttemptFailure {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err.to_string())
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::Timeout => "timeout",
            Self::Status(_) => "http_error",
            Self::Decode(_) => "decode_error",
        }
    }

    fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status(status) => Some(*status),
            _ => None,
        }
    }

    fn into_api_error(self, endpoint: &str, attempts: u32) -> ApiError {
        let status = self.status();
        if let Some(status) = status.filter(|s| is_auth_failure(*s)) {
            return ApiError::Unauthorized {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            };
        }

        let message = match self {
            Self::Transport(msg) => msg,
            Self::Timeout => "attempt timed out".to_string(),
            Self::Status(status) => format!("HTTP {status}"),
            Self::Decode(msg) => format!("malformed response body: {msg}"),
        };
        ApiError::ConnectionFailure {
            endpoint: endpoint.to_string(),
            attempts,
            status: status.map(|s| s.as_u16()),
            message,
        }
    }
}

/// Retrying client for the upstream API.
#[derive(Clone)]
pub struct ResilientApiClient {
    http: reqwest::Client,
    base_url: String,
    token_header: HeaderName,
    token: HeaderValue,
    timeout: Duration,
    policy: RetryPolicy,
    default_deadline: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for ResilientApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResilientApiClient")
            .field("base_url", &self.base_url)
            .field("token_header", &self.token_header)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("policy", &self.policy)
            .field("default_deadline", &self.default_deadline)
            .finish()
    }
}

impl ResilientApiClient {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a client that reads wall-clock time from `clock`.
    pub fn with_clock(config: &ApiConfig, clock: Arc<dyn Clock>) -> ApiResult<Self> {
        let parsed = Url::parse(&config.base_url)
            .map_err(|e| ApiError::Config(format!("invalid base_url '{}': {}", config.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "base_url must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let token_header = HeaderName::from_bytes(config.token_header.as_bytes())
            .map_err(|e| ApiError::Config(format!("invalid token_header: {e}")))?;
        let mut token = HeaderValue::from_str(&config.token)
            .map_err(|_| ApiError::Config("token contains characters not allowed in a header".into()))?;
        token.set_sensitive(true);

        let http = reqwest::Client::builder()
            .user_agent(concat!("logsearch-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token_header,
            token,
            timeout: Duration::from_secs(config.timeout_secs),
            policy: RetryPolicy::from(config),
            default_deadline: config.deadline_secs.map(Duration::from_secs),
            clock,
        })
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Full URL for an endpoint path.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    fn default_context(&self) -> RequestContext {
        self.default_deadline
            .map(RequestContext::with_timeout)
            .unwrap_or_default()
    }

    /// Search for events matching `query`.
    ///
    /// Missing time bounds default to the last hour, the limit is clamped to
    /// 1..=1000 (default 100). Failures come back as [`SearchResult::Failed`].
    pub async fn search_logs(&self, query: &str, options: SearchOptions) -> SearchResult {
        self.search_logs_with_context(query, options, self.default_context())
            .await
    }

    /// Like [`search_logs`](Self::search_logs), bounded by `ctx`'s deadline.
    pub async fn search_logs_with_context(
        &self,
        query: &str,
        options: SearchOptions,
        ctx: RequestContext,
    ) -> SearchResult {
        let request = SearchRequest::resolve(query, &options, self.clock.now());
        let started = Instant::now();

        let result = match self
            .execute::<RawSearchResponse>(SEARCH_ENDPOINT, &request.query_params(), ctx, self.policy.max_attempts)
            .await
        {
            Ok(raw) => {
                let page = SearchPage::from_raw(raw, &request, self.clock.now());
                tracing::debug!(
                    query = %request.query,
                    events = page.events.len(),
                    total = page.total,
                    "Search completed"
                );
                SearchResult::Found(page)
            }
            Err(e) => {
                tracing::error!(query = %request.query, error = %e, "Search failed");
                SearchResult::Failed(e)
            }
        };

        metrics::record_search(result.is_success(), started.elapsed());
        result
    }

    pub async fn list_systems(&self) -> ApiResult<Vec<LogSystem>> {
        self.execute(SYSTEMS_ENDPOINT, &[], self.default_context(), self.policy.max_attempts)
            .await
    }

    pub async fn list_groups(&self) -> ApiResult<Vec<LogGroup>> {
        self.execute(GROUPS_ENDPOINT, &[], self.default_context(), self.policy.max_attempts)
            .await
    }

    /// Probe the upstream with a single systems request.
    pub async fn test_connectivity(&self) -> ConnectivityReport {
        let started = Instant::now();
        let outcome = self
            .execute::<Vec<LogSystem>>(SYSTEMS_ENDPOINT, &[], self.default_context(), 1)
            .await;
        let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(systems) => ConnectivityReport {
                connected: true,
                latency_ms,
                systems: Some(systems.len()),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "Upstream connectivity check failed");
                ConnectivityReport {
                    connected: false,
                    latency_ms,
                    systems: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// Run up to `max_attempts` attempts against `endpoint`.
    async fn execute<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&'static str, String)],
        ctx: RequestContext,
        max_attempts: u32,
    ) -> ApiResult<T> {
        let max_attempts = max_attempts.max(1);
        let mut attempts = 0u32;

        loop {
            let Some(budget) = ctx.attempt_timeout(self.timeout) else {
                return Err(ApiError::DeadlineExceeded {
                    endpoint: endpoint.to_string(),
                    attempts,
                });
            };
            attempts += 1;

            let failure = match self.attempt::<T>(endpoint, params, budget).await {
                Ok(value) => {
                    metrics::record_upstream_attempt(endpoint, "success");
                    if attempts > 1 {
                        tracing::info!(endpoint, attempts, "Upstream request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };
            metrics::record_upstream_attempt(endpoint, failure.label());

            if let Some(status) = failure.status() {
                if !self.policy.is_retryable_status(status) {
                    tracing::warn!(endpoint, status = status.as_u16(), "Upstream rejected credential");
                    return Err(failure.into_api_error(endpoint, attempts));
                }
            }

            if ctx.is_expired() {
                return Err(ApiError::DeadlineExceeded {
                    endpoint: endpoint.to_string(),
                    attempts,
                });
            }

            if attempts >= max_attempts {
                tracing::warn!(endpoint, attempts, failure = ?failure, "Upstream retries exhausted");
                return Err(failure.into_api_error(endpoint, attempts));
            }

            let delay = self.policy.delay_for(attempts);
            tracing::warn!(
                endpoint,
                attempt = attempts,
                max_attempts,
                delay_ms = delay.as_millis() as u64,
                failure = ?failure,
                "Upstream attempt failed, retrying"
            );

            if !ctx.sleep(delay).await {
                return Err(ApiError::DeadlineExceeded {
                    endpoint: endpoint.to_string(),
                    attempts,
                });
            }
        }
    }

    async fn attempt<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&'static str, String)],
        budget: Duration,
    ) -> Result<T, AttemptFailure> {
        let response = self
            .http
            .get(self.endpoint_url(endpoint))
            .header(ACCEPT, "application/json")
            .header(self.token_header.clone(), self.token.clone())
            .query(params)
            .timeout(budget)
            .send()
            .await
            .map_err(AttemptFailure::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptFailure::Status(status));
        }

        let body = response.bytes().await.map_err(AttemptFailure::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|e| AttemptFailure::Decode(e.to_string()))
    }
}
