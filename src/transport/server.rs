//! WebSocket transport attached to the host listener.
//!
//! # Responsibilities
//! - Mount a WebSocket endpoint into the host's upgrade slot
//! - Track open connections
//! - Fan inbound frames out to subscribers, outbound envelopes to clients
//!
//! # Data Flow
//! ```text
//! Client ──frames──→ host listener → upgrade slot → handle_socket
//!     → TransportEvent broadcast → subscribers
//! TransportHandle::emit → outbound broadcast → every handle_socket → Client
//! ```
//!
//! # Design Decisions
//! - Attaching never blocks; the listener is already accepting
//! - Slow clients lag and skip envelopes rather than stall others

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
    routing::get,
    Router,
};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};

use crate::config::TransportConfig;
use crate::host::{ListenerHandle, SlotOccupied};
use crate::observability::metrics;
use crate::transport::message::{ConnectionId, Envelope, TransportEvent};

/// Errors raised while attaching the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport cannot attach: {0}")]
    AlreadyAttached(#[from] SlotOccupied),

    #[error("invalid transport path '{0}'")]
    InvalidPath(String),

    #[error("transport channel capacity must be greater than zero")]
    ZeroCapacity,

    #[error("transport message limit must be greater than zero")]
    ZeroMessageLimit,
}

#[derive(Debug, Clone)]
struct Outbound {
    target: Option<ConnectionId>,
    text: String,
}

struct Inner {
    path: String,
    local_addr: SocketAddr,
    max_message_bytes: usize,
    events: broadcast::Sender<TransportEvent>,
    outbound: broadcast::Sender<Outbound>,
    connections: DashMap<ConnectionId, ()>,
}

/// A live real-time transport bound to the host listener.
///
/// Cheap to clone; all clones address the same server.
#[derive(Clone)]
pub struct TransportHandle {
    inner: Arc<Inner>,
}

/// Builds transports over a host listener.
pub struct TransportServer;

impl TransportServer {
    /// Attach a new transport to `listener`.
    pub fn attach(
        listener: &ListenerHandle,
        config: &TransportConfig,
    ) -> Result<TransportHandle, TransportError> {
        let path = check_config(config)?;
        let (events, _) = broadcast::channel(config.channel_capacity);
        let (outbound, _) = broadcast::channel(config.channel_capacity);

        let handle = TransportHandle {
            inner: Arc::new(Inner {
                path: path.clone(),
                local_addr: listener.local_addr(),
                max_message_bytes: config.max_message_bytes,
                events,
                outbound,
                connections: DashMap::new(),
            }),
        };

        let router = Router::new()
            .route(&path, get(ws_handler))
            .route(&format!("{}/", path), get(ws_handler))
            .with_state(handle.clone());

        listener.upgrade_slot().install(&path, router)?;

        tracing::info!(
            address = %listener.local_addr(),
            path = %path,
            "Transport attached"
        );

        Ok(handle)
    }
}

/// Check `config` the way [`TransportServer::attach`] will, returning the
/// normalized mount path.
pub fn check_config(config: &TransportConfig) -> Result<String, TransportError> {
    let path = normalize_path(&config.path)?;
    if config.channel_capacity == 0 {
        return Err(TransportError::ZeroCapacity);
    }
    if config.max_message_bytes == 0 {
        return Err(TransportError::ZeroMessageLimit);
    }
    Ok(path)
}

/// Strip trailing slashes and reject paths the router cannot mount literally.
pub fn normalize_path(path: &str) -> Result<String, TransportError> {
    let trimmed = path.trim_end_matches('/');
    let valid = trimmed.starts_with('/')
        && trimmed.len() > 1
        && !trimmed.contains(['{', '}', '*', '?', '#']);
    if valid {
        Ok(trimmed.to_string())
    } else {
        Err(TransportError::InvalidPath(path.to_string()))
    }
}

impl TransportHandle {
    /// Path clients connect to.
    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Address of the listener this transport is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }

    /// Receive connection and message events from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TransportEvent> {
        self.inner.events.subscribe()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    pub fn connections(&self) -> Vec<ConnectionId> {
        self.inner.connections.iter().map(|e| *e.key()).collect()
    }

    /// Broadcast an envelope to every connected client.
    ///
    /// Returns the number of connections it was queued for.
    pub fn emit(&self, envelope: &Envelope) -> Result<usize, serde_json::Error> {
        self.send(None, envelope)
    }

    /// Send an envelope to one connection.
    pub fn emit_to(
        &self,
        connection: ConnectionId,
        envelope: &Envelope,
    ) -> Result<usize, serde_json::Error> {
        self.send(Some(connection), envelope)
    }

    fn send(
        &self,
        target: Option<ConnectionId>,
        envelope: &Envelope,
    ) -> Result<usize, serde_json::Error> {
        let text = envelope.encode()?;
        Ok(self.inner.outbound.send(Outbound { target, text }).unwrap_or(0))
    }

    fn register(&self, id: ConnectionId) {
        self.inner.connections.insert(id, ());
        metrics::set_transport_connections(self.connection_count());
        let _ = self.inner.events.send(TransportEvent::Connected(id));
    }

    fn unregister(&self, id: ConnectionId) {
        self.inner.connections.remove(&id);
        metrics::set_transport_connections(self.connection_count());
        let _ = self.inner.events.send(TransportEvent::Disconnected(id));
    }
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportHandle")
            .field("path", &self.inner.path)
            .field("local_addr", &self.inner.local_addr)
            .field("connections", &self.connection_count())
            .finish()
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(handle): State<TransportHandle>) -> Response {
    let limit = handle.inner.max_message_bytes;
    ws.max_message_size(limit)
        .max_frame_size(limit)
        .on_upgrade(move |socket| handle_socket(socket, handle))
}

async fn handle_socket(socket: WebSocket, handle: TransportHandle) {
    let id = ConnectionId::new();
    let (mut sender, mut receiver) = socket.split();
    let mut outbound = handle.inner.outbound.subscribe();

    let hello = Envelope::new("connect", serde_json::json!({ "id": id }));
    let Ok(hello) = hello.encode() else {
        return;
    };
    if sender.send(Message::Text(hello.into())).await.is_err() {
        return;
    }

    handle.register(id);
    tracing::debug!(connection = %id, "Transport connection opened");

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => match Envelope::decode(text.as_str()) {
                    Ok(envelope) => {
                        metrics::record_transport_message("inbound");
                        let _ = handle.inner.events.send(TransportEvent::Message {
                            connection: id,
                            envelope,
                        });
                    }
                    Err(e) => {
                        tracing::warn!(connection = %id, error = %e, "Dropping malformed frame");
                    }
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(connection = %id, error = %e, "Transport read failed");
                    break;
                }
            },
            out = outbound.recv() => match out {
                Ok(out) if out.target.map_or(true, |target| target == id) => {
                    if sender.send(Message::Text(out.text.into())).await.is_err() {
                        break;
                    }
                    metrics::record_transport_message("outbound");
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(connection = %id, skipped, "Transport client lagging");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    handle.unregister(id);
    tracing::debug!(connection = %id, "Transport connection closed");
}
