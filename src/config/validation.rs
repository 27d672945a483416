//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (TTLs and windows > 0, limits > 0)
//! - Detect conflicting route policies
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the parsed config
//! - Runs before the config is accepted into the system

use std::collections::HashSet;

use crate::config::schema::GatewayConfig;

/// A single semantic violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every violation.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.access_ttl_secs == 0 {
        errors.push(ValidationError {
            field: "auth.access_ttl_secs".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.auth.refresh_ttl_secs <= config.auth.access_ttl_secs {
        errors.push(ValidationError {
            field: "auth.refresh_ttl_secs".into(),
            message: "must exceed access_ttl_secs".into(),
        });
    }

    if config.admission.default_limit == 0 {
        errors.push(ValidationError {
            field: "admission.default_limit".into(),
            message: "must be greater than zero".into(),
        });
    }
    if config.admission.default_window_secs == 0 {
        errors.push(ValidationError {
            field: "admission.default_window_secs".into(),
            message: "must be greater than zero".into(),
        });
    }

    let mut seen_routes = HashSet::new();
    for policy in &config.admission.routes {
        let field = format!("admission.routes[{}]", policy.route);
        if policy.limit == 0 {
            errors.push(ValidationError {
                field: format!("{field}.limit"),
                message: "must be greater than zero".into(),
            });
        }
        if policy.window_secs == 0 {
            errors.push(ValidationError {
                field: format!("{field}.window_secs"),
                message: "must be greater than zero".into(),
            });
        }
        if !seen_routes.insert(policy.route.clone()) {
            errors.push(ValidationError {
                field,
                message: "duplicate route policy".into(),
            });
        }
    }

    if config.transform.wait_timeout_ms == 0 {
        errors.push(ValidationError {
            field: "transform.wait_timeout_ms".into(),
            message: "must be greater than zero".into(),
        });
    }
    if !config.transform.base_url.starts_with("http://")
        && !config.transform.base_url.starts_with("https://")
    {
        errors.push(ValidationError {
            field: "transform.base_url".into(),
            message: "must be an http(s) URL".into(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
