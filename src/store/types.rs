//! Store handle and error definitions.

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, MutexGuard};

use crate::store::endpoint::StoreEndpoint;

/// Errors that can occur while acquiring a store connection.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The connection string could not be parsed.
    #[error("invalid store endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The TCP connection was refused or failed.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The connection attempt exceeded the connector's deadline.
    #[error("connection to {endpoint} timed out after {secs} seconds")]
    Timeout { endpoint: String, secs: u64 },
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// A live connection to the data store.
///
/// Cheap to clone; every clone shares the same underlying socket.
#[derive(Debug, Clone)]
pub struct StoreHandle {
    endpoint: StoreEndpoint,
    peer_addr: SocketAddr,
    stream: Arc<Mutex<TcpStream>>,
}

impl StoreHandle {
    /// Wrap an established connection.
    pub fn new(endpoint: StoreEndpoint, stream: TcpStream) -> std::io::Result<Self> {
        let peer_addr = stream.peer_addr()?;
        Ok(Self {
            endpoint,
            peer_addr,
            stream: Arc::new(Mutex::new(stream)),
        })
    }

    /// The endpoint this handle was acquired from.
    pub fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    /// Address of the store server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Exclusive access to the underlying socket.
    pub async fn lock(&self) -> MutexGuard<'_, TcpStream> {
        self.stream.lock().await
    }

    /// True if both handles share the same connection.
    pub fn same_connection(&self, other: &StoreHandle) -> bool {
        Arc::ptr_eq(&self.stream, &other.stream)
    }
}
