//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses parse as socket addresses
//! - Validate value ranges (limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::Zero { field: "limits.max_body_bytes" });
    }
    if config.limits.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "limits.request_timeout_secs" });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
