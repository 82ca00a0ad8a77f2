//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the log-search gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Upstream log-search API settings.
    pub api: ApiConfig,

    /// Per-caller admission control.
    pub admission: AdmissionConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoints.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Upper bound on handling one inbound request, retries included.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 120,
        }
    }
}

/// Upstream API client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the remote API, without the endpoint path.
    pub base_url: String,

    /// API credential. Overridden by `LOGSEARCH_API_TOKEN` when set.
    pub token: String,

    /// Header that carries the credential.
    pub token_header: String,

    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,

    /// Total attempts per logical request (first try included).
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,

    /// Extra random delay as a fraction of the computed backoff (0.0 disables).
    pub jitter_ratio: f64,

    /// Optional per-call deadline covering all attempts and delays.
    pub deadline_secs: Option<u64>,

    /// Retry 401/403 responses like any other failure.
    pub retry_auth_failures: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://papertrailapp.com/api/v1".to_string(),
            token: String::new(),
            token_header: "X-Papertrail-Token".to_string(),
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            jitter_ratio: 0.0,
            deadline_secs: None,
            retry_auth_failures: false,
        }
    }
}

/// Admission control configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Enable admission control.
    pub enabled: bool,

    /// Maximum requests per caller inside one sliding window.
    pub requests_per_minute: u32,

    /// Maximum burst credits per caller.
    pub burst_capacity: u32,

    /// Sliding window length in seconds.
    pub window_secs: u64,

    /// Seconds of inactivity that earn one burst credit back.
    pub refill_interval_secs: u64,

    /// Callers idle longer than this are dropped by the sweep.
    pub idle_timeout_secs: u64,

    /// How often the background sweep runs.
    pub sweep_interval_secs: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            requests_per_minute: 30,
            burst_capacity: 5,
            window_secs: 60,
            refill_interval_secs: 10,
            idle_timeout_secs: 300,
            sweep_interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount the admin routes.
    pub enabled: bool,

    /// Bearer key required by the admin routes. No key means no check.
    pub api_key: Option<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
        }
    }
}
