//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacities and intervals above zero)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: TransportConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::TransportConfig;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("pool.max_cap must be greater than 0")]
    ZeroMaxCap,

    #[error("pool.dial_timeout_ms must be greater than 0")]
    ZeroDialTimeout,

    #[error("pool.check_interval_secs must be greater than 0")]
    ZeroCheckInterval,

    #[error("selector.refresh_interval_secs must be greater than 0")]
    ZeroRefreshInterval,
}

/// Check a deserialized config for semantic problems.
pub fn validate_config(config: &TransportConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.pool.max_cap == 0 {
        errors.push(ValidationError::ZeroMaxCap);
    }
    if config.pool.dial_timeout_ms == 0 {
        errors.push(ValidationError::ZeroDialTimeout);
    }
    if config.pool.check_interval_secs == 0 {
        errors.push(ValidationError::ZeroCheckInterval);
    }
    if config.selector.refresh_interval_secs == 0 {
        errors.push(ValidationError::ZeroRefreshInterval);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
