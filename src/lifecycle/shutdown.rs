//! Shutdown coordination for the host.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;

/// The host's shutdown procedure, as seen by services embedded in it.
pub trait HostControl: Send + Sync {
    /// Ask the host to stop. Must not block.
    fn close(&self);
}

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that all long-running tasks can subscribe to.
/// Clones share the same channel.
#[derive(Clone)]
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<()>,
    /// Number of times shutdown was requested.
    requests: Arc<AtomicUsize>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send(());
    }

    /// Whether shutdown has been requested at least once.
    pub fn is_triggered(&self) -> bool {
        self.request_count() > 0
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Get the number of active subscribers (tasks still running).
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl HostControl for Shutdown {
    fn close(&self) {
        tracing::warn!("Host close requested");
        self.trigger();
    }
}
