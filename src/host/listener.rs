//! Host TCP listener and the handle shared with attached services.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Expose a cloneable handle describing the bound listener
//! - Hold the upgrade slot a real-time service mounts itself into
//!
//! # Design Decisions
//! - The slot accepts exactly one mount for the life of the listener
//! - The host reads the slot lock-free on every request

use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use axum::Router;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// A service mounted into the host listener under a path prefix.
#[derive(Clone)]
pub struct MountedRoute {
    pub path: String,
    pub router: Router,
}

/// Returned when a second service tries to mount into an occupied slot.
#[derive(Debug, Error)]
#[error("upgrade slot already taken by '{existing}'")]
pub struct SlotOccupied {
    pub existing: String,
}

/// Mount point through which the host forwards matching requests.
#[derive(Clone, Default)]
pub struct UpgradeSlot {
    inner: Arc<OnceLock<MountedRoute>>,
}

impl UpgradeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `router` under `path`. Fails if something is already mounted.
    pub fn install(&self, path: &str, router: Router) -> Result<(), SlotOccupied> {
        let route = MountedRoute {
            path: path.to_string(),
            router,
        };
        self.inner.set(route).map_err(|_| SlotOccupied {
            existing: self.mounted_path().unwrap_or_default(),
        })
    }

    /// The mounted route, if any.
    pub fn get(&self) -> Option<&MountedRoute> {
        self.inner.get()
    }

    pub fn mounted_path(&self) -> Option<String> {
        self.inner.get().map(|r| r.path.clone())
    }

    /// Mounted route whose prefix covers `path`.
    pub fn route_for(&self, path: &str) -> Option<&MountedRoute> {
        self.inner.get().filter(|route| path_matches(&route.path, path))
    }
}

fn path_matches(prefix: &str, path: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Read-only description of the host listener, handed out on readiness.
#[derive(Clone)]
pub struct ListenerHandle {
    local_addr: SocketAddr,
    slot: UpgradeSlot,
}

impl ListenerHandle {
    pub fn new(local_addr: SocketAddr, slot: UpgradeSlot) -> Self {
        Self { local_addr, slot }
    }

    /// Address the host is accepting connections on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Slot shared with the host server.
    pub fn upgrade_slot(&self) -> &UpgradeSlot {
        &self.slot
    }
}

impl std::fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("local_addr", &self.local_addr)
            .field("mounted", &self.slot.mounted_path())
            .finish()
    }
}

/// The host's bound TCP listener.
pub struct HostListener {
    inner: TcpListener,
    handle: ListenerHandle,
}

impl HostListener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            address: config.bind_address.clone(),
            source,
        };

        let listener = TcpListener::bind(&config.bind_address)
            .await
            .map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        tracing::info!(address = %local_addr, "Listener bound");

        Ok(Self {
            inner: listener,
            handle: ListenerHandle::new(local_addr, UpgradeSlot::new()),
        })
    }

    /// A handle sharing this listener's upgrade slot.
    pub fn handle(&self) -> ListenerHandle {
        self.handle.clone()
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.handle.local_addr
    }

    /// Give up the raw listener to the server that will accept on it.
    pub fn into_parts(self) -> (TcpListener, ListenerHandle) {
        (self.inner, self.handle)
    }
}
