//! Real-time transport subsystem.
//!
//! A small bidirectional event server that shares the host's listener. Frames
//! are JSON text envelopes `{"event": ..., "data": ...}`; on join each client
//! receives a `connect` envelope carrying its connection id.

pub mod message;
pub mod server;

pub use message::{ConnectionId, Envelope, EnvelopeError, TransportEvent};
pub use server::{check_config, normalize_path, TransportError, TransportHandle, TransportServer};
