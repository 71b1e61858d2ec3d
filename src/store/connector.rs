//! Store connection acquisition.
//!
//! # Responsibilities
//! - Define the seam the coordinator acquires connections through
//! - Provide a TCP connector with a bounded connect deadline
//!
//! # Design Decisions
//! - The deadline lives here, not in the coordinator
//! - One attempt per call; retrying is the caller's choice

use std::future::Future;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::config::StoreConfig;
use crate::store::endpoint::StoreEndpoint;
use crate::store::types::{StoreError, StoreHandle, StoreResult};

/// Something that can open a connection to the data store.
pub trait StoreConnector: Send + Sync {
    /// Open one connection to `endpoint`.
    fn connect(
        &self,
        endpoint: &StoreEndpoint,
    ) -> impl Future<Output = StoreResult<StoreHandle>> + Send;
}

/// Connects to the store over plain TCP.
#[derive(Debug, Clone)]
pub struct TcpStoreConnector {
    connect_timeout: Duration,
}

impl TcpStoreConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(Duration::from_secs(config.connect_timeout_secs))
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl StoreConnector for TcpStoreConnector {
    async fn connect(&self, endpoint: &StoreEndpoint) -> StoreResult<StoreHandle> {
        tracing::debug!(
            endpoint = %endpoint,
            timeout_ms = self.connect_timeout.as_millis() as u64,
            "Connecting to data store"
        );

        let attempt = TcpStream::connect((endpoint.host(), endpoint.port()));
        let stream = match timeout(self.connect_timeout, attempt).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(source)) => {
                return Err(StoreError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })
            }
            Err(_) => {
                return Err(StoreError::Timeout {
                    endpoint: endpoint.to_string(),
                    secs: self.connect_timeout.as_secs(),
                })
            }
        };

        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(endpoint = %endpoint, error = %e, "Failed to set TCP_NODELAY on store connection");
        }

        StoreHandle::new(endpoint.clone(), stream).map_err(|source| StoreError::Connect {
            endpoint: endpoint.to_string(),
            source,
        })
    }
}
