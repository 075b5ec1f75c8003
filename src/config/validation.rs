//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (backlog, buffer size, deadlines, retry delays)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.backlog must be between 1 and {max}, got {value}")]
    Backlog { value: u32, max: u32 },

    #[error("connection.buffer_capacity must be at least 2, got {0}")]
    BufferCapacity(usize),

    #[error("{field} must be greater than zero")]
    ZeroTimeout { field: &'static str },

    #[error("retries.max_attempts must be at least 1 when retries are enabled")]
    RetryAttempts,

    #[error("retries.base_delay_ms ({base}) exceeds retries.max_delay_ms ({max})")]
    RetryDelays { base: u64, max: u64 },

    #[error("observability.log_level is not a valid filter: {0}")]
    LogLevel(String),
}

/// Largest backlog `listen(2)` accepts as an `int`.
const MAX_BACKLOG: u32 = i32::MAX as u32;

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let backlog = config.listener.backlog;
    if backlog == 0 || backlog > MAX_BACKLOG {
        errors.push(ValidationError::Backlog {
            value: backlog,
            max: MAX_BACKLOG,
        });
    }

    // One byte of every buffer is held back from reads.
    if config.connection.buffer_capacity < 2 {
        errors.push(ValidationError::BufferCapacity(config.connection.buffer_capacity));
    }

    if config.connection.accept_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout {
            field: "connection.accept_timeout_secs",
        });
    }
    if config.connection.idle_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout {
            field: "connection.idle_timeout_secs",
        });
    }

    let retries = &config.retries;
    if retries.enabled && retries.max_attempts == 0 {
        errors.push(ValidationError::RetryAttempts);
    }
    if retries.base_delay_ms > retries.max_delay_ms {
        errors.push(ValidationError::RetryDelays {
            base: retries.base_delay_ms,
            max: retries.max_delay_ms,
        });
    }

    if let Err(e) = EnvFilter::try_new(&config.observability.log_level) {
        errors.push(ValidationError::LogLevel(e.to_string()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
