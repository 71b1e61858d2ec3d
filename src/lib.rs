//! Store and transport bootstrap coordinator.
//!
//! Gates two external services behind the host's "ready to accept
//! connections" event: a data store connection and a real-time transport
//! bound to the host's own listener. Each acquired handle goes to an
//! embedder-supplied consumer exactly once; anything that cannot be acquired
//! stops the host.

// The coordinator
pub mod bootstrap;

// Collaborators
pub mod host;
pub mod store;
pub mod transport;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use bootstrap::{BootstrapError, BootstrapOptions, Coordinator};
pub use config::SctcConfig;
pub use lifecycle::Shutdown;
