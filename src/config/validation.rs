//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports, pool size, body limit)
//! - Check addresses the service will bind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let required = [
        ("database.name", &config.database.name),
        ("database.user", &config.database.user),
        ("database.host", &config.database.host),
        ("listener.host", &config.listener.host),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty { field });
        }
    }

    if config.database.port == 0 {
        errors.push(ValidationError::Zero { field: "database.port" });
    }
    if config.pool.multiplier == 0 {
        errors.push(ValidationError::Zero { field: "pool.multiplier" });
    }
    if config.pool.workers == Some(0) {
        errors.push(ValidationError::Zero { field: "pool.workers" });
    }
    if config.http.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "http.max_body_bytes" });
    }
    if config.http.drain_timeout_ms == 0 {
        errors.push(ValidationError::Zero { field: "http.drain_timeout_ms" });
    }
    if config.startup.max_attempts == Some(0) {
        errors.push(ValidationError::Zero { field: "startup.max_attempts" });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
