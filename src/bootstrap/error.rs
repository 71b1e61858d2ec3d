//! Bootstrap error definitions.

use thiserror::Error;

use crate::bootstrap::options::Callback;
use crate::bootstrap::state::Phase;
use crate::store::StoreError;
use crate::transport::TransportError;

/// The embedder's options are unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required {callback} callback; provide it before starting the host")]
    MissingCallback { callback: Callback },
}

/// Errors that end a bootstrap attempt.
///
/// Every variant except `AlreadyStarted` is raised only after the host has
/// been asked to shut down.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("store endpoint is unusable: {0}")]
    InvalidEndpoint(#[source] StoreError),

    #[error("transport settings are unusable: {0}")]
    InvalidTransport(#[source] TransportError),

    #[error("failed to connect to the data store at {endpoint}")]
    StoreAcquisitionFailed {
        endpoint: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to attach the transport to the host listener")]
    TransportAttachFailed(#[source] TransportError),

    #[error("host closed before signalling readiness")]
    ReadyChannelClosed,

    #[error("bootstrap already started (phase: {phase})")]
    AlreadyStarted { phase: Phase },
}

impl BootstrapError {
    /// Label used for the `outcome` metric.
    pub fn outcome(&self) -> &'static str {
        match self {
            BootstrapError::Config(_)
            | BootstrapError::InvalidEndpoint(_)
            | BootstrapError::InvalidTransport(_) => "config_error",
            BootstrapError::StoreAcquisitionFailed { .. } => "store_failed",
            BootstrapError::TransportAttachFailed(_) => "transport_failed",
            BootstrapError::ReadyChannelClosed => "host_closed",
            BootstrapError::AlreadyStarted { .. } => "duplicate_ready",
        }
    }
}
