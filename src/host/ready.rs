//! One-shot "ready to accept connections" notification.
//!
//! The host fires the notifier once the listener is accepting; the single
//! subscriber receives the listener handle. Firing consumes the notifier, so
//! the event cannot be delivered twice through this channel.

use thiserror::Error;
use tokio::sync::oneshot;

use crate::host::listener::ListenerHandle;

/// The host went away without ever signalling readiness.
#[derive(Debug, Error)]
#[error("host closed before signalling readiness")]
pub struct ReadyClosed;

/// Sending half, owned by the host.
#[derive(Debug)]
pub struct ReadyNotifier {
    tx: oneshot::Sender<ListenerHandle>,
}

/// Receiving half, owned by the subscriber.
#[derive(Debug)]
pub struct ReadySubscription {
    rx: oneshot::Receiver<ListenerHandle>,
}

/// Create a connected notifier/subscription pair.
pub fn ready_channel() -> (ReadyNotifier, ReadySubscription) {
    let (tx, rx) = oneshot::channel();
    (ReadyNotifier { tx }, ReadySubscription { rx })
}

impl ReadyNotifier {
    /// Signal readiness. Returns the handle back if nobody is subscribed.
    pub fn notify(self, handle: ListenerHandle) -> Result<(), ListenerHandle> {
        tracing::debug!(address = %handle.local_addr(), "Host ready");
        self.tx.send(handle)
    }
}

impl ReadySubscription {
    /// Wait for the host to become ready.
    pub async fn wait(self) -> Result<ListenerHandle, ReadyClosed> {
        self.rx.await.map_err(|_| ReadyClosed)
    }
}
