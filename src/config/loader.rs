//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable that overrides `api.token`.
pub const TOKEN_ENV: &str = "LOGSEARCH_API_TOKEN";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration text without touching the environment or validating.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Apply environment overrides on top of file values.
pub fn apply_env_overrides(config: &mut GatewayConfig) {
    if let Ok(token) = std::env::var(TOKEN_ENV) {
        if !token.trim().is_empty() {
            config.api.token = token;
        }
    }
}

/// Validate a configuration after environment overrides.
pub fn finalize_config(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    finalize_config(parse_config(&content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_partial_config_keeps_defaults() {
        let config = parse_config(
            r#"
            [api]
            token = "abc"
            max_retries = 5

            [admission]
            requests_per_minute = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.api.token, "abc");
        assert_eq!(config.api.max_retries, 5);
        assert_eq!(config.api.base_delay_ms, 1000);
        assert_eq!(config.admission.requests_per_minute, 2);
        assert_eq!(config.admission.burst_capacity, 5);
        assert_eq!(config.admission.idle_timeout_secs, 300);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_config("[api\ntoken = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Parse error"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let mut config = parse_config("[admission]\nburst_capacity = 0\n").unwrap();
        config.api.token = "abc".to_string();
        let err = validate_config(&config).map_err(ConfigError::Validation).unwrap_err();
        assert!(err.to_string().contains("admission.burst_capacity"));
    }
}
