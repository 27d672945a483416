//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Why a configuration file was rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", join_violations(.0))]
    Validation(Vec<ValidationError>),
}

fn join_violations(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_loads_with_defaults() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.auth.access_ttl_secs, 900);
        assert_eq!(config.admission.default_limit, 60);
        assert!(config.admission.routes.is_empty());
    }

    #[test]
    fn route_policies_parse() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[admission.routes]]
            route = "signup"
            limit = 5
            window_secs = 300
            scope = "ip"

            [transform]
            wait_timeout_ms = 10000
            "#,
        )
        .unwrap();
        assert_eq!(config.admission.routes.len(), 1);
        assert_eq!(config.admission.routes[0].limit, 5);
        assert_eq!(config.transform.wait_timeout_ms, 10_000);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_config(Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn every_violation_lands_in_the_error_message() {
        let mut config = GatewayConfig::default();
        config.auth.access_ttl_secs = 0;
        config.admission.default_limit = 0;
        let err = ConfigError::Validation(validate_config(&config).unwrap_err());
        let message = err.to_string();
        assert!(message.contains("auth.access_ttl_secs"));
        assert!(message.contains("admission.default_limit"));
    }
}
