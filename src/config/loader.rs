//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::SctcConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
///
/// The environment override is not applied here.
pub fn parse_config(content: &str) -> Result<SctcConfig, ConfigLoadError> {
    let config: SctcConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigLoadError::Validation)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<SctcConfig, ConfigLoadError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Resolve the effective startup configuration.
///
/// Reads the file when a path is given (defaults otherwise), layers the
/// connection-string override from the environment on top and validates the
/// result. This is the only place the environment is consulted.
pub fn resolve_config(path: Option<&Path>) -> Result<SctcConfig, ConfigLoadError> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => SctcConfig::default(),
    }
    .resolve_env();

    validate_config(&config).map_err(ConfigLoadError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:4000"

            [store]
            connection_string = "mongodb://db:27017"
            connect_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:4000");
        assert_eq!(config.store.connect_timeout_secs, 5);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = parse_config("[store\nconnection_string = 1").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Parse(_)));
    }

    #[test]
    fn test_validation_errors_are_joined() {
        let err = parse_config(
            r#"
            [store]
            connect_timeout_secs = 0

            [transport]
            channel_capacity = 0
            "#,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with("Validation failed: "));
        assert!(message.contains("connect_timeout_secs"));
        assert!(message.contains("channel_capacity"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/sctc.toml")).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Io(_)));
    }
}
