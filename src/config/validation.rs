//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (thresholds >= 1, durations > 0)
//! - Validate target and listener addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, ProbeKind};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("health_check.{0} must be at least 1")]
    ThresholdTooLow(&'static str),

    #[error("health_check.{0} must be greater than zero")]
    ZeroDuration(&'static str),

    #[error("health_check.path must start with '/', got {0:?}")]
    InvalidProbePath(String),

    #[error("target {0:?} is not a valid host:port")]
    InvalidTarget(String),

    #[error("duplicate target {0:?}")]
    DuplicateTarget(String),

    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("admin.api_key must be set when the admin endpoint is enabled")]
    MissingApiKey,

    #[error("unknown log level {0:?}")]
    InvalidLogLevel(String),
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let hc = &config.health_check;

    if hc.unhealthy_threshold == 0 {
        errors.push(ValidationError::ThresholdTooLow("unhealthy_threshold"));
    }
    if hc.healthy_threshold == 0 {
        errors.push(ValidationError::ThresholdTooLow("healthy_threshold"));
    }
    if hc.interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration("interval_ms"));
    }
    if hc.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration("timeout_ms"));
    }
    if hc.kind == ProbeKind::Http && !hc.path.starts_with('/') {
        errors.push(ValidationError::InvalidProbePath(hc.path.clone()));
    }

    let mut seen = HashSet::new();
    for target in &config.targets {
        let target = target.trim();
        if !is_host_port(target) {
            errors.push(ValidationError::InvalidTarget(target.to_string()));
        } else if !seen.insert(target) {
            errors.push(ValidationError::DuplicateTarget(target.to_string()));
        }
    }

    let obs = &config.observability;
    if !LOG_LEVELS.contains(&obs.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::InvalidLogLevel(obs.log_level.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: obs.metrics_address.clone(),
        });
    }

    if config.admin.enabled {
        if config.admin.bind_address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field: "admin.bind_address",
                value: config.admin.bind_address.clone(),
            });
        }
        if config.admin.api_key.is_empty() {
            errors.push(ValidationError::MissingApiKey);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `host:port` with a non-empty host and a numeric port; IPv6 hosts bracketed.
fn is_host_port(target: &str) -> bool {
    let Some((host, port)) = target.rsplit_once(':') else {
        return false;
    };
    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);
    !host.is_empty() && !host.contains(char::is_whitespace) && port.parse::<u16>().is_ok()
}
