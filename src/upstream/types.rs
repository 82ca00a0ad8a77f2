//! Wire types, normalized results and error definitions for the upstream API.

use std::time::{Duration, SystemTime};

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use crate::clock::epoch_secs;

/// Smallest accepted result limit.
pub const MIN_SEARCH_LIMIT: u32 = 1;
/// Largest result limit the upstream accepts.
pub const MAX_SEARCH_LIMIT: u32 = 1000;
/// Limit used when the caller does not give one.
pub const DEFAULT_SEARCH_LIMIT: u32 = 100;
/// How far back a search looks when no `min_time` is given.
pub const DEFAULT_LOOKBACK: Duration = Duration::from_secs(3600);

/// Errors that can occur while talking to the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Every attempt failed; carries the last failure seen.
    #[error("request to {endpoint} failed after {attempts} attempt(s): {message}")]
    ConnectionFailure {
        endpoint: String,
        attempts: u32,
        /// Last HTTP status, absent for transport failures.
        status: Option<u16>,
        message: String,
    },

    /// The upstream refused the credential (401/403).
    #[error("request to {endpoint} was rejected with status {status}: credential not accepted")]
    Unauthorized { endpoint: String, status: u16 },

    /// The per-call deadline expired before a successful attempt.
    #[error("deadline exceeded for {endpoint} after {attempts} attempt(s)")]
    DeadlineExceeded { endpoint: String, attempts: u32 },

    /// The client could not be constructed.
    #[error("invalid API client configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Stable snake_case label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectionFailure { .. } => "api_connection_failure",
            Self::Unauthorized { .. } => "api_unauthorized",
            Self::DeadlineExceeded { .. } => "api_deadline_exceeded",
            Self::Config(_) => "api_config",
        }
    }

    /// Last upstream HTTP status, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::ConnectionFailure { status, .. } => *status,
            Self::Unauthorized { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type for upstream operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Caller-supplied search options. Absent fields take defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Earliest event time, epoch seconds.
    pub min_time: Option<u64>,
    /// Latest event time, epoch seconds.
    pub max_time: Option<u64>,
    /// Requested result count; clamped before use.
    pub limit: Option<i64>,
    pub system_id: Option<u64>,
    pub group_id: Option<u64>,
}

impl SearchOptions {
    #[must_use]
    pub fn with_time_range(mut self, min_time: u64, max_time: u64) -> Self {
        self.min_time = Some(min_time);
        self.max_time = Some(max_time);
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn with_system(mut self, system_id: u64) -> Self {
        self.system_id = Some(system_id);
        self
    }

    #[must_use]
    pub fn with_group(mut self, group_id: u64) -> Self {
        self.group_id = Some(group_id);
        self
    }
}

/// Clamp a requested limit into `[MIN_SEARCH_LIMIT, MAX_SEARCH_LIMIT]`.
pub fn clamp_limit(limit: Option<i64>) -> u32 {
    match limit {
        None => DEFAULT_SEARCH_LIMIT,
        Some(n) => {
            let clamped = n.clamp(i64::from(MIN_SEARCH_LIMIT), i64::from(MAX_SEARCH_LIMIT));
            u32::try_from(clamped).unwrap_or(DEFAULT_SEARCH_LIMIT)
        }
    }
}

/// Inclusive time bounds actually sent upstream, epoch seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub min_time: u64,
    pub max_time: u64,
}

/// A fully resolved search, ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub time_range: TimeRange,
    pub limit: u32,
    pub system_id: Option<u64>,
    pub group_id: Option<u64>,
}

impl SearchRequest {
    /// Fill in defaults: each missing bound independently, `limit` clamped.
    pub fn resolve(query: &str, options: &SearchOptions, now: SystemTime) -> Self {
        let now_secs = epoch_secs(now);
        let max_time = options.max_time.unwrap_or(now_secs);
        let min_time = options
            .min_time
            .unwrap_or_else(|| now_secs.saturating_sub(DEFAULT_LOOKBACK.as_secs()));

        Self {
            query: query.to_string(),
            time_range: TimeRange { min_time, max_time },
            limit: clamp_limit(options.limit),
            system_id: options.system_id,
            group_id: options.group_id,
        }
    }

    /// Query-string parameters for the search endpoint.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("q", self.query.clone()),
            ("min_time", self.time_range.min_time.to_string()),
            ("max_time", self.time_range.max_time.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(system_id) = self.system_id {
            params.push(("system_id", system_id.to_string()));
        }
        if let Some(group_id) = self.group_id {
            params.push(("group_id", group_id.to_string()));
        }
        params
    }
}

/// One log event as returned by the search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub received_at: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub display_received_at: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub facility: Option<String>,
    #[serde(default)]
    pub source_id: Option<u64>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub source_ip: Option<String>,
}

/// Raw search payload. Everything is optional; normalization fills gaps.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawSearchResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub events: Vec<LogEvent>,
    #[serde(default)]
    pub total_hits: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub min_id: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub max_id: Option<String>,
    #[serde(default)]
    pub reached_beginning: Option<bool>,
    #[serde(default)]
    pub reached_time_limit: Option<bool>,
}

/// A successful search, normalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPage {
    pub events: Vec<LogEvent>,
    /// Upstream total when reported, otherwise the number of events returned.
    pub total: u64,
    /// Bounds actually used, defaults included.
    pub time_range: TimeRange,
    pub limit: u32,
    /// When the search completed, epoch seconds.
    pub search_timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_beginning: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reached_time_limit: Option<bool>,
}

impl SearchPage {
    pub(crate) fn from_raw(raw: RawSearchResponse, request: &SearchRequest, searched_at: SystemTime) -> Self {
        let total = raw
            .total_hits
            .or(raw.total)
            .unwrap_or(raw.events.len() as u64);
        Self {
            events: raw.events,
            total,
            time_range: request.time_range,
            limit: request.limit,
            search_timestamp: epoch_secs(searched_at),
            min_id: raw.min_id,
            max_id: raw.max_id,
            reached_beginning: raw.reached_beginning,
            reached_time_limit: raw.reached_time_limit,
        }
    }
}

/// Outcome of a search. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    Found(SearchPage),
    Failed(ApiError),
}

impl SearchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    pub fn page(&self) -> Option<&SearchPage> {
        match self {
            Self::Found(page) => Some(page),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&ApiError> {
        match self {
            Self::Found(_) => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    pub fn into_result(self) -> ApiResult<SearchPage> {
        match self {
            Self::Found(page) => Ok(page),
            Self::Failed(e) => Err(e),
        }
    }
}

impl Serialize for SearchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Found<'a> {
            success: bool,
            #[serde(flatten)]
            page: &'a SearchPage,
        }

        #[derive(Serialize)]
        struct Failed {
            success: bool,
            error_kind: &'static str,
            error_message: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            upstream_status: Option<u16>,
        }

        match self {
            Self::Found(page) => Found { success: true, page }.serialize(serializer),
            Self::Failed(error) => Failed {
                success: false,
                error_kind: error.kind(),
                error_message: error.to_string(),
                upstream_status: error.status(),
            }
            .serialize(serializer),
        }
    }
}

/// A system (log sender) known to the upstream account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSystem {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub last_event_at: Option<String>,
}

/// A named group of systems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroup {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub system_wildcard: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub systems: Vec<LogSystem>,
}

/// Result of probing the upstream API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectivityReport {
    pub connected: bool,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub systems: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    Unsigned(u64),
    Signed(i64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::Unsigned(n) => n.to_string(),
            StringOrNumber::Signed(n) => n.to_string(),
        }
    }
}

// Identifiers come back as strings from some endpoints and numbers from others.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    StringOrNumber::deserialize(deserializer)
        .map(String::from)
        .map_err(|_| de::Error::custom("expected a string or integer identifier"))
}

// Explicit nulls are treated like missing keys.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<StringOrNumber>::deserialize(deserializer).map(|v| v.map(String::from))
}
