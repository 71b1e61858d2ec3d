//! Data store acquisition subsystem.
//!
//! # Data Flow
//! ```text
//! store.connection_string (resolved at startup)
//!     → endpoint.rs (parse, default port, redaction)
//!     → connector.rs (single connect attempt with deadline)
//!     → StoreHandle (handed to the store consumer)
//! ```
//!
//! # Security Constraints
//! - Never log the password part of a connection string

pub mod connector;
pub mod endpoint;
pub mod types;

pub use connector::{StoreConnector, TcpStoreConnector};
pub use endpoint::StoreEndpoint;
pub use types::{StoreError, StoreHandle, StoreResult};
