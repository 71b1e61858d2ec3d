//! Consumer callbacks supplied by the embedding application.

use std::fmt;

use crate::store::StoreHandle;
use crate::transport::TransportHandle;

/// Receives the store connection once it is acquired.
pub type StoreConsumer = Box<dyn FnOnce(StoreHandle) + Send + 'static>;

/// Receives the transport once it is bound to the host listener.
pub type TransportConsumer = Box<dyn FnOnce(TransportHandle) + Send + 'static>;

/// Names one of the two required callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    Store,
    Transport,
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callback::Store => f.write_str("on_store"),
            Callback::Transport => f.write_str("on_transport"),
        }
    }
}

/// The coordinator's configuration: one consumer per acquired resource.
///
/// Both callbacks are required; see [`validate`](crate::bootstrap::validate).
///
/// ```ignore
/// let options = BootstrapOptions::new()
///     .on_store(|store| tracing::info!(peer = %store.peer_addr(), "store ready"))
///     .on_transport(|transport| tracing::info!(path = transport.path(), "transport ready"));
/// ```
#[derive(Default)]
pub struct BootstrapOptions {
    pub(crate) on_store: Option<StoreConsumer>,
    pub(crate) on_transport: Option<TransportConsumer>,
}

impl BootstrapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_store(mut self, consumer: impl FnOnce(StoreHandle) + Send + 'static) -> Self {
        self.on_store = Some(Box::new(consumer));
        self
    }

    pub fn on_transport(
        mut self,
        consumer: impl FnOnce(TransportHandle) + Send + 'static,
    ) -> Self {
        self.on_transport = Some(Box::new(consumer));
        self
    }

    /// The first required callback that is absent, store first.
    pub fn missing(&self) -> Option<Callback> {
        if self.on_store.is_none() {
            Some(Callback::Store)
        } else if self.on_transport.is_none() {
            Some(Callback::Transport)
        } else {
            None
        }
    }
}

impl fmt::Debug for BootstrapOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BootstrapOptions")
            .field("on_store", &self.on_store.is_some())
            .field("on_transport", &self.on_transport.is_some())
            .finish()
    }
}
