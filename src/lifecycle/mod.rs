//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate options → Bind listener → Serve → Fire ready → Coordinator
//!
//! Shutdown (shutdown.rs):
//!     close()/trigger() → broadcast → host server drains → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: options first, then listener, then ready
//! - Services embedded in the host see only `HostControl`
//! - Shutdown requests are counted so callers can assert on them

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{HostControl, Shutdown};
pub use startup::{start, RunningHost, StartupError};
