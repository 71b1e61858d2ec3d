//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → MONGODB_CONNECTION_STRING override (read once)
//!     → validation.rs (semantic checks)
//!     → SctcConfig (validated, immutable)
//!     → passed by value/reference into the host and coordinator
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, resolve_config, ConfigLoadError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, SctcConfig, StoreConfig, TransportConfig,
    CONNECTION_STRING_ENV, DEFAULT_CONNECTION_STRING,
};
pub use validation::{validate_config, ValidationError};
