//! `sctc` host binary.
//!
//! Starts a minimal host, waits for it to accept connections, then brings up
//! the data store connection and the real-time transport. Any failure to
//! acquire either stops the host and exits non-zero.
//!
//! ```text
//!   --config sctc.toml ─┐
//!   MONGODB_CONNECTION_STRING ─┴→ SctcConfig
//!                                    │
//!   bind listener → serve → ready ───┴→ Coordinator
//!                                          ├→ store connect → on_store
//!                                          └→ transport attach → on_transport
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use sctc::bootstrap::BootstrapOptions;
use sctc::config::{resolve_config, validate_config, ConfigLoadError};
use sctc::lifecycle::{signals, start, Shutdown};
use sctc::observability::{logging, metrics};
use sctc::store::{StoreEndpoint, TcpStoreConnector};
use sctc::transport::{Envelope, TransportEvent};

#[derive(Parser)]
#[command(name = "sctc")]
#[command(about = "Gate store and real-time transport startup behind host readiness", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = resolve_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigLoadError::Validation)?;
    }

    logging::init_logging(&config.observability);
    tracing::info!("sctc v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        store = %StoreEndpoint::parse(&config.store.connection_string)
            .map(|endpoint| endpoint.to_string())
            .unwrap_or_default(),
        transport_path = %config.transport.path,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::warn!(
                address = %config.observability.metrics_address,
                error = %e,
                "Metrics exporter disabled: invalid address"
            ),
        }
    }

    let options = BootstrapOptions::new()
        .on_store(|store| {
            tracing::info!(peer = %store.peer_addr(), "Store handle received");
        })
        .on_transport(|transport| {
            tracing::info!(path = transport.path(), "Transport handle received");
            let mut events = transport.subscribe();
            tokio::spawn(async move {
                while let Ok(event) = events.recv().await {
                    if let TransportEvent::Message { envelope, .. } = event {
                        let echo = Envelope::new(envelope.event, envelope.data);
                        if let Err(e) = transport.emit(&echo) {
                            tracing::warn!(error = %e, "Failed to relay envelope");
                        }
                    }
                }
            });
        });

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(shutdown.clone());

    let connector = TcpStoreConnector::from_config(&config.store);
    let host = start(&config, options, connector, shutdown).await?;
    tracing::info!(address = %host.local_addr(), "Listening for connections");

    host.wait().await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
