//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use sctc::SctcConfig;
use tokio::net::TcpListener;

/// A stand-in data store that accepts connections and holds them open.
pub struct MockStore {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
}

impl MockStore {
    #[allow(dead_code)]
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

/// Start a mock store on an ephemeral loopback port.
pub async fn start_mock_store() -> MockStore {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            open.push(socket);
        }
    });

    MockStore { addr, accepted }
}

/// A loopback port with nothing listening on it.
#[allow(dead_code)]
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Config binding the host to an ephemeral port and pointing at `store_port`.
pub fn test_config(store_port: u16) -> SctcConfig {
    let mut config = SctcConfig::default()
        .with_connection_override(Some(format!("mongodb://127.0.0.1:{}", store_port)));
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.store.connect_timeout_secs = 2;
    config
}
