//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the endpoint is a WebSocket URL
//! - Validate value ranges (timeouts > 0, amounts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProbeConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::{OperationMode, ProbeConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
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

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProbeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match url::Url::parse(&config.node.endpoint) {
        Ok(url) if matches!(url.scheme(), "ws" | "wss") => {}
        Ok(url) => errors.push(ValidationError::new(
            "node.endpoint",
            format!("unsupported scheme '{}', expected ws or wss", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "node.endpoint",
            format!("invalid URL '{}': {}", config.node.endpoint, e),
        )),
    }

    if config.node.connect_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "node.connect_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.accounts.sender_uri.trim().is_empty() {
        errors.push(ValidationError::new("accounts.sender_uri", "must not be empty"));
    }
    if config.accounts.recipient_uri.trim().is_empty() {
        errors.push(ValidationError::new("accounts.recipient_uri", "must not be empty"));
    }

    if config.run.mode == OperationMode::Transfer {
        if config.transfer.amount == 0 {
            errors.push(ValidationError::new("transfer.amount", "must be greater than zero"));
        }
        if config.transfer.call.trim().is_empty() {
            errors.push(ValidationError::new("transfer.call", "must not be empty"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
