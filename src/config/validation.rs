//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and the upgrade path
//! - Validate value ranges (capacity > 0, timeouts > 0, sizes > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BridgeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::BridgeConfig;
use crate::transport::queue::QueueCapacity;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem, tagged with the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
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

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check `config` and collect every problem found.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }
    if !config.listener.path.starts_with('/') {
        errors.push(ValidationError::new(
            "listener.path",
            "must start with '/'",
        ));
    }

    let transport = &config.transport;
    if transport.queue_capacity == QueueCapacity::Bounded(0) {
        errors.push(ValidationError::new(
            "transport.queue_capacity",
            "bounded capacity must be greater than zero",
        ));
    }
    if transport.watchdog.enabled && transport.watchdog.read_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "transport.watchdog.read_timeout_secs",
            "must be greater than zero when the watchdog is enabled",
        ));
    }

    let socket = &transport.socket;
    for (field, value) in [
        ("transport.socket.max_message_size", socket.max_message_size),
        ("transport.socket.max_frame_size", socket.max_frame_size),
        ("transport.socket.write_buffer_size", socket.write_buffer_size),
        ("transport.socket.max_write_buffer_size", socket.max_write_buffer_size),
    ] {
        if value == Some(0) {
            errors.push(ValidationError::new(field, "must be greater than zero"));
        }
    }
    if let (Some(frame), Some(message)) = (socket.max_frame_size, socket.max_message_size) {
        if frame > message {
            errors.push(ValidationError::new(
                "transport.socket.max_frame_size",
                format!("{frame} exceeds max_message_size {message}"),
            ));
        }
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
