//! Bootstrap coordination subsystem.
//!
//! # Data Flow
//! ```text
//! BootstrapOptions (on_store, on_transport)
//!     → validate (missing callback → host close → ConfigError)
//!     → Coordinator waits on the host's ready event
//!     → StoreConnector::connect (the only await)
//!         ok  → on_store(store) → TransportServer::attach → on_transport(transport)
//!         err → host close → StoreAcquisitionFailed
//! ```
//!
//! # Design Decisions
//! - Either both consumers run, in that order, or neither does
//! - Every failure closes the host before the error is returned
//! - One attempt per process; `Failed` is final

pub mod coordinator;
pub mod error;
pub mod options;
pub mod state;

pub use coordinator::{validate, Bootstrapped, Coordinator};
pub use error::{BootstrapError, ConfigError};
pub use options::{BootstrapOptions, Callback, StoreConsumer, TransportConsumer};
pub use state::Phase;
