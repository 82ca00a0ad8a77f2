//! Dispatcher between inbound callers and the upstream API.
//!
//! # Responsibilities
//! - Validate raw search parameters before anything else runs
//! - Ask admission control for permission on every upstream-bound call
//! - Forward admitted calls to the resilient client
//!
//! # Design Decisions
//! - A denied call never reaches the upstream and is never retried here
//! - Invalid input is rejected without consuming admission credits
//! - Connectivity probes bypass admission; they are operator tools

use std::sync::Arc;

use serde::Deserialize;

use crate::admission::AdmissionController;
use crate::config::GatewayConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::upstream::{
    ApiResult, ConnectivityReport, LogGroup, LogSystem, ResilientApiClient, SearchOptions,
    SearchPage, SearchResult,
};

/// Search parameters exactly as they arrive, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSearchParams {
    pub q: Option<String>,
    pub min_time: Option<String>,
    pub max_time: Option<String>,
    pub limit: Option<String>,
    pub system_id: Option<String>,
    pub group_id: Option<String>,
}

/// A validated search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub options: SearchOptions,
}

impl SearchParams {
    pub fn new(query: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            query: query.into(),
            options,
        }
    }

    /// Validate raw fields. Empty strings count as absent, except for `q`.
    pub fn parse(raw: &RawSearchParams) -> ServiceResult<Self> {
        let query = raw.q.as_deref().map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(ServiceError::InvalidInput("query 'q' must not be empty".into()));
        }

        let options = SearchOptions {
            min_time: parse_field("min_time", raw.min_time.as_deref())?,
            max_time: parse_field("max_time", raw.max_time.as_deref())?,
            limit: parse_limit(raw.limit.as_deref())?,
            system_id: parse_field("system_id", raw.system_id.as_deref())?,
            group_id: parse_field("group_id", raw.group_id.as_deref())?,
        };

        if let (Some(min), Some(max)) = (options.min_time, options.max_time) {
            if min > max {
                return Err(ServiceError::InvalidInput(format!(
                    "min_time ({min}) is after max_time ({max})"
                )));
            }
        }

        Ok(Self::new(query, options))
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, value: Option<&str>) -> ServiceResult<Option<T>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => v
            .parse()
            .map(Some)
            .map_err(|_| ServiceError::InvalidInput(format!("'{name}' must be an integer, got '{v}'"))),
    }
}

/// Like `parse_field`, but integers beyond `i64` saturate instead of failing;
/// the client clamps them into range later.
fn parse_limit(value: Option<&str>) -> ServiceResult<Option<i64>> {
    match parse_field::<i64>("limit", value) {
        Err(e) => {
            let v = value.map(str::trim).unwrap_or_default();
            let (negative, digits) = match v.strip_prefix('-') {
                Some(rest) => (true, rest),
                None => (false, v.strip_prefix('+').unwrap_or(v)),
            };
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(e);
            }
            Ok(Some(if negative { i64::MIN } else { i64::MAX }))
        }
        ok => ok,
    }
}

#[derive(Debug, Clone)]
pub struct LogSearchService {
    admission: Arc<AdmissionController>,
    client: ResilientApiClient,
    admission_enabled: bool,
}

impl LogSearchService {
    pub fn new(admission: Arc<AdmissionController>, client: ResilientApiClient, admission_enabled: bool) -> Self {
        Self {
            admission,
            client,
            admission_enabled,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> ApiResult<Self> {
        let admission = Arc::new(AdmissionController::from_config(&config.admission));
        let client = ResilientApiClient::new(&config.api)?;
        Ok(Self::new(admission, client, config.admission.enabled))
    }

    pub fn admission(&self) -> &Arc<AdmissionController> {
        &self.admission
    }

    pub fn client(&self) -> &ResilientApiClient {
        &self.client
    }

    fn admit(&self, caller_id: &str) -> ServiceResult<()> {
        if !self.admission_enabled {
            return Ok(());
        }

        let decision = self.admission.check_limit(caller_id);
        if decision.allowed {
            return Ok(());
        }
        Err(ServiceError::RateLimitExceeded {
            caller_id: caller_id.to_string(),
            reason: decision.reason,
            retry_after_secs: decision.retry_after_secs.unwrap_or(1),
        })
    }

    /// Admission check, then search.
    pub async fn search(&self, caller_id: &str, params: SearchParams) -> ServiceResult<SearchPage> {
        self.admit(caller_id)?;
        let SearchParams { query, options } = params;

        match self.client.search_logs(&query, options).await {
            SearchResult::Found(page) => Ok(page),
            SearchResult::Failed(e) => Err(e.into()),
        }
    }

    pub async fn list_systems(&self, caller_id: &str) -> ServiceResult<Vec<LogSystem>> {
        self.admit(caller_id)?;
        Ok(self.client.list_systems().await?)
    }

    pub async fn list_groups(&self, caller_id: &str) -> ServiceResult<Vec<LogGroup>> {
        self.admit(caller_id)?;
        Ok(self.client.list_groups().await?)
    }

    pub async fn test_connectivity(&self) -> ConnectivityReport {
        self.client.test_connectivity().await
    }
}
