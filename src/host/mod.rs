//! Host application subsystem.
//!
//! The smallest host the coordinator can be embedded in: it owns the network
//! listener, emits the ready event and can be told to shut down.
//!
//! # Data Flow
//! ```text
//! listener.rs (bind, ListenerHandle + upgrade slot)
//!     → server.rs (serve /healthz, forward mounted prefix)
//!     → ready.rs (one-shot notification carrying the ListenerHandle)
//! ```

pub mod listener;
pub mod ready;
pub mod server;

pub use listener::{HostListener, ListenerError, ListenerHandle, MountedRoute, SlotOccupied, UpgradeSlot};
pub use ready::{ready_channel, ReadyClosed, ReadyNotifier, ReadySubscription};
pub use server::HostServer;
