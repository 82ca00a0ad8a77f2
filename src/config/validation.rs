//! Configuration validation.
//!
//! Serde handles syntax; this module checks values: a credential is present,
//! the base URL is an absolute http(s) URL, limits and intervals are positive.
//! All problems are reported together, not just the first.

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::new("listener.bind_address", "must not be empty"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be greater than 0"));
    }

    let api = &config.api;
    match Url::parse(&api.base_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "api.base_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new("api.base_url", e.to_string())),
    }
    if api.token.trim().is_empty() {
        errors.push(ValidationError::new(
            "api.token",
            "missing credential (set api.token or LOGSEARCH_API_TOKEN)",
        ));
    }
    if api.token_header.trim().is_empty() {
        errors.push(ValidationError::new("api.token_header", "must not be empty"));
    }
    if api.timeout_secs == 0 {
        errors.push(ValidationError::new("api.timeout_secs", "must be greater than 0"));
    }
    if api.max_retries == 0 {
        errors.push(ValidationError::new("api.max_retries", "must allow at least one attempt"));
    }
    if api.max_delay_ms < api.base_delay_ms {
        errors.push(ValidationError::new("api.max_delay_ms", "must not be below api.base_delay_ms"));
    }
    if !(0.0..=1.0).contains(&api.jitter_ratio) {
        errors.push(ValidationError::new("api.jitter_ratio", "must be within [0.0, 1.0]"));
    }
    if api.deadline_secs == Some(0) {
        errors.push(ValidationError::new("api.deadline_secs", "must be greater than 0 when set"));
    }

    let admission = &config.admission;
    if admission.requests_per_minute == 0 {
        errors.push(ValidationError::new("admission.requests_per_minute", "must be greater than 0"));
    }
    if admission.burst_capacity == 0 {
        errors.push(ValidationError::new("admission.burst_capacity", "must be greater than 0"));
    }
    for (field, value) in [
        ("admission.window_secs", admission.window_secs),
        ("admission.refill_interval_secs", admission.refill_interval_secs),
        ("admission.idle_timeout_secs", admission.idle_timeout_secs),
        ("admission.sweep_interval_secs", admission.sweep_interval_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::new(field, "must be greater than 0"));
        }
    }
    if admission.idle_timeout_secs < admission.window_secs {
        errors.push(ValidationError::new(
            "admission.idle_timeout_secs",
            "must not be shorter than admission.window_secs",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a socket address",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
