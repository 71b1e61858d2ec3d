//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacities > 0)
//! - Check the connection string and bind address parse
//! - Check the transport path with the same rule the transport mounts by
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SctcConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SctcConfig;
use crate::store::StoreEndpoint;
use crate::transport::normalize_path;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("store.connection_string is invalid: {0}")]
    ConnectionString(String),

    #[error("store.connect_timeout_secs must be greater than zero")]
    ZeroConnectTimeout,

    #[error("transport.path '{0}' must be an absolute, non-root path without route wildcards")]
    TransportPath(String),

    #[error("transport.channel_capacity must be greater than zero")]
    ZeroChannelCapacity,

    #[error("transport.max_message_bytes must be greater than zero")]
    ZeroMessageLimit,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &SctcConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Err(e) = StoreEndpoint::parse(&config.store.connection_string) {
        errors.push(ValidationError::ConnectionString(e.to_string()));
    }

    if config.store.connect_timeout_secs == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }

    if normalize_path(&config.transport.path).is_err() {
        errors.push(ValidationError::TransportPath(config.transport.path.clone()));
    }

    if config.transport.channel_capacity == 0 {
        errors.push(ValidationError::ZeroChannelCapacity);
    }

    if config.transport.max_message_bytes == 0 {
        errors.push(ValidationError::ZeroMessageLimit);
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
