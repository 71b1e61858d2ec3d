//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate the embedder's options before anything is bound
//! - Bind the host listener and start serving
//! - Fire the ready event and let the coordinator take over
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Steps run in order, not concurrently
//! - The ready event fires only once the listener is accepting

use std::net::SocketAddr;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};

use crate::bootstrap::{BootstrapError, BootstrapOptions, Bootstrapped, Coordinator, Phase};
use crate::config::SctcConfig;
use crate::host::{ready_channel, HostListener, HostServer, ListenerError};
use crate::lifecycle::shutdown::Shutdown;
use crate::store::StoreConnector;

/// Errors that stop the host from starting or keep it from running.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("host server failed: {0}")]
    Server(#[from] std::io::Error),

    #[error("startup task panicked or was cancelled: {0}")]
    Task(#[from] JoinError),
}

/// A started host with its coordinator in flight.
pub struct RunningHost {
    local_addr: SocketAddr,
    shutdown: Shutdown,
    phase: watch::Receiver<Phase>,
    bootstrap: JoinHandle<Result<Bootstrapped, BootstrapError>>,
    server: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningHost {
    /// Address the host accepted connections on.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Observe the coordinator's phase.
    pub fn phase(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    /// Wait until the coordinator reaches `Ready` or `Failed`.
    pub async fn settled(&self) -> Phase {
        let mut phase = self.phase.clone();
        if let Ok(current) = phase.wait_for(|p| p.is_terminal()).await {
            return *current;
        }
        let current = *phase.borrow();
        current
    }

    /// Run until the host stops.
    ///
    /// A failed bootstrap has already closed the host; its error is returned
    /// once the server has drained. If the coordinator task itself dies, the
    /// host is closed here and drained before the task error is returned.
    pub async fn wait(self) -> Result<(), StartupError> {
        let outcome = match self.bootstrap.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Bootstrap task aborted, stopping host");
                self.shutdown.trigger();
                match self.server.await {
                    Ok(Err(server)) => tracing::warn!(error = %server, "Host server failed while stopping"),
                    Err(join) => tracing::warn!(error = %join, "Host server task aborted"),
                    Ok(Ok(())) => {}
                }
                return Err(StartupError::Task(e));
            }
        };
        self.server.await??;
        outcome?;
        Ok(())
    }
}

/// Start the host and arm the coordinator.
///
/// `config` must already have the connection-string override applied.
pub async fn start<C>(
    config: &SctcConfig,
    options: BootstrapOptions,
    connector: C,
    shutdown: Shutdown,
) -> Result<RunningHost, StartupError>
where
    C: StoreConnector + 'static,
{
    let coordinator = Coordinator::new(options, config, connector, shutdown.clone())?;
    let phase = coordinator.watch();

    let listener = HostListener::bind(&config.listener).await?;
    let local_addr = listener.local_addr();
    let (tcp, handle) = listener.into_parts();

    let (notifier, subscription) = ready_channel();
    let bootstrap = tokio::spawn(async move { coordinator.run(subscription).await });

    let server = HostServer::new(handle.clone());
    let server_shutdown = shutdown.subscribe();
    let server = tokio::spawn(async move { server.run(tcp, server_shutdown).await });

    if notifier.notify(handle).is_err() {
        tracing::warn!("Coordinator dropped before the host became ready");
    }

    Ok(RunningHost {
        local_addr,
        shutdown,
        phase,
        bootstrap,
        server,
    })
}
