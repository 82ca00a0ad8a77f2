//! Startup orchestration.

use std::path::Path;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, GatewayConfig};
use crate::service::LogSearchService;
use crate::upstream::ApiError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialize upstream client: {0}")]
    Client(#[from] ApiError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Load the config file, or fall back to defaults when no path is given.
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig, StartupError> {
    match path {
        Some(path) => Ok(load_config(path)?),
        None => Ok(crate::config::loader::finalize_config(GatewayConfig::default())?),
    }
}

pub fn build_service(config: &GatewayConfig) -> Result<LogSearchService, StartupError> {
    let service = LogSearchService::from_config(config)?;
    tracing::info!(
        base_url = %config.api.base_url,
        max_retries = config.api.max_retries,
        admission_enabled = config.admission.enabled,
        requests_per_minute = config.admission.requests_per_minute,
        burst_capacity = config.admission.burst_capacity,
        "Log search service initialized"
    );
    Ok(service)
}

pub async fn bind_listener(address: &str) -> Result<TcpListener, StartupError> {
    TcpListener::bind(address).await.map_err(|source| StartupError::Bind {
        address: address.to_string(),
        source,
    })
}
