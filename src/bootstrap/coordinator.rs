//! The bootstrap coordinator.
//!
//! # Responsibilities
//! - Refuse to start without both consumer callbacks
//! - Wait for the host's ready event
//! - Acquire the store, then bind the transport to the host listener
//! - Hand each resource to its consumer exactly once, store first
//! - Stop the host before surfacing any failure
//!
//! # Design Decisions
//! - Store acquisition is the only await point; everything after it is synchronous
//! - No retry and no timeout of its own; the connector owns the deadline
//! - A phase flag makes a repeated ready event a reported no-op
//! - Transport settings are checked in `new`, so `on_store` is never followed by a config failure

use std::net::SocketAddr;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use tokio::sync::watch;

use crate::bootstrap::error::{BootstrapError, ConfigError};
use crate::bootstrap::options::{BootstrapOptions, StoreConsumer, TransportConsumer};
use crate::bootstrap::state::Phase;
use crate::config::{SctcConfig, TransportConfig};
use crate::host::{ListenerHandle, ReadySubscription};
use crate::lifecycle::HostControl;
use crate::observability::metrics;
use crate::store::{StoreConnector, StoreEndpoint};
use crate::transport::{check_config, TransportServer};

/// Check that both consumer callbacks are present.
///
/// On failure the host is closed before the error is returned, so no
/// half-started host is left running.
pub fn validate<H: HostControl>(options: &BootstrapOptions, host: &H) -> Result<(), ConfigError> {
    match options.missing() {
        None => Ok(()),
        Some(callback) => {
            let err = ConfigError::MissingCallback { callback };
            tracing::error!(callback = %callback, "{}", err);
            host.close();
            Err(err)
        }
    }
}

/// Summary of a successful bootstrap. The handles themselves went to the consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bootstrapped {
    pub store_endpoint: String,
    pub store_peer: SocketAddr,
    pub transport_path: String,
    pub listener_addr: SocketAddr,
}

struct Consumers {
    on_store: StoreConsumer,
    on_transport: TransportConsumer,
}

/// Sequences store and transport acquisition behind the host's ready event.
pub struct Coordinator<C, H> {
    endpoint: StoreEndpoint,
    transport: TransportConfig,
    connector: C,
    host: H,
    consumers: Mutex<Option<Consumers>>,
    phase: watch::Sender<Phase>,
}

impl<C, H> Coordinator<C, H>
where
    C: StoreConnector,
    H: HostControl,
{
    /// Validate `options` and prepare to wait for readiness.
    ///
    /// `config` must already carry the resolved connection string; the
    /// environment is not consulted from here on.
    pub fn new(
        options: BootstrapOptions,
        config: &SctcConfig,
        connector: C,
        host: H,
    ) -> Result<Self, BootstrapError> {
        if let Err(e) = validate(&options, &host) {
            metrics::record_bootstrap("config_error");
            return Err(e.into());
        }

        let endpoint = match StoreEndpoint::parse(&config.store.connection_string) {
            Ok(endpoint) => endpoint,
            Err(e) => {
                tracing::error!(error = %e, "Store endpoint rejected");
                host.close();
                metrics::record_bootstrap("config_error");
                return Err(BootstrapError::InvalidEndpoint(e));
            }
        };

        if let Err(e) = check_config(&config.transport) {
            tracing::error!(error = %e, path = %config.transport.path, "Transport settings rejected");
            host.close();
            metrics::record_bootstrap("config_error");
            return Err(BootstrapError::InvalidTransport(e));
        }

        let (on_store, on_transport) = match (options.on_store, options.on_transport) {
            (Some(on_store), Some(on_transport)) => (on_store, on_transport),
            _ => unreachable!("validate checked both callbacks"),
        };

        let (phase, _) = watch::channel(Phase::Validated);
        let coordinator = Self {
            endpoint,
            transport: config.transport.clone(),
            connector,
            host,
            consumers: Mutex::new(Some(Consumers {
                on_store,
                on_transport,
            })),
            phase,
        };
        coordinator.advance(Phase::AwaitingReady);

        tracing::debug!(endpoint = %coordinator.endpoint, "Bootstrap awaiting host readiness");
        Ok(coordinator)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Observe phase changes.
    pub fn watch(&self) -> watch::Receiver<Phase> {
        self.phase.subscribe()
    }

    pub fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    /// Wait for the host's ready event, then bootstrap.
    pub async fn run(&self, ready: ReadySubscription) -> Result<Bootstrapped, BootstrapError> {
        match ready.wait().await {
            Ok(listener) => self.on_ready(listener).await,
            Err(_) => Err(self.fail(BootstrapError::ReadyChannelClosed)),
        }
    }

    /// Handle the host's ready event.
    ///
    /// Only the first call does anything; later calls return
    /// [`BootstrapError::AlreadyStarted`] without touching the consumers or
    /// the host.
    pub async fn on_ready(&self, listener: ListenerHandle) -> Result<Bootstrapped, BootstrapError> {
        if !self.advance(Phase::Acquiring) {
            let phase = self.phase();
            tracing::warn!(phase = %phase, "Ignoring repeated ready event");
            return Err(BootstrapError::AlreadyStarted { phase });
        }

        let consumers = self
            .consumers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(consumers) = consumers else {
            return Err(BootstrapError::AlreadyStarted { phase: self.phase() });
        };

        tracing::info!(
            endpoint = %self.endpoint,
            listener = %listener.local_addr(),
            "Host ready, connecting to data store"
        );

        let start = Instant::now();
        let store = match self.connector.connect(&self.endpoint).await {
            Ok(store) => {
                metrics::record_store_connect(start, true);
                store
            }
            Err(source) => {
                metrics::record_store_connect(start, false);
                tracing::error!(endpoint = %self.endpoint, error = %source, "Store connection failed");
                return Err(self.fail(BootstrapError::StoreAcquisitionFailed {
                    endpoint: self.endpoint.to_string(),
                    source,
                }));
            }
        };

        let store_peer = store.peer_addr();
        (consumers.on_store)(store);
        tracing::info!(endpoint = %self.endpoint, peer = %store_peer, "Connected to data store");

        let transport = match TransportServer::attach(&listener, &self.transport) {
            Ok(transport) => transport,
            Err(e) => return Err(self.fail(BootstrapError::TransportAttachFailed(e))),
        };
        let transport_path = transport.path().to_string();
        (consumers.on_transport)(transport);

        self.advance(Phase::Ready);
        metrics::record_bootstrap("ready");
        tracing::info!(
            listener = %listener.local_addr(),
            path = %transport_path,
            "Bootstrap complete"
        );

        Ok(Bootstrapped {
            store_endpoint: self.endpoint.to_string(),
            store_peer,
            transport_path,
            listener_addr: listener.local_addr(),
        })
    }

    /// Move to `next` if the transition is legal. Returns whether it moved.
    fn advance(&self, next: Phase) -> bool {
        self.phase.send_if_modified(|phase| {
            if phase.can_transition_to(next) {
                tracing::debug!(from = %phase, to = %next, "Bootstrap phase");
                *phase = next;
                true
            } else {
                false
            }
        })
    }

    /// Mark the attempt failed and stop the host, then hand back `err` to raise.
    fn fail(&self, err: BootstrapError) -> BootstrapError {
        self.advance(Phase::Failed);
        self.host.close();
        metrics::record_bootstrap(err.outcome());
        tracing::error!(error = %err, "Bootstrap failed");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use tokio::net::{TcpListener, TcpStream};

    use crate::host::{ready_channel, UpgradeSlot};
    use crate::store::{StoreError, StoreHandle, StoreResult};
    use crate::transport::TransportError;

    #[derive(Clone, Default)]
    struct RecordingHost {
        closes: Arc<AtomicUsize>,
    }

    impl RecordingHost {
        fn closes(&self) -> usize {
            self.closes.load(Ordering::SeqCst)
        }
    }

    impl HostControl for RecordingHost {
        fn close(&self) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Refuses every attempt, recording the endpoint it was asked for.
    #[derive(Clone, Default)]
    struct RefusingConnector {
        attempts: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl StoreConnector for RefusingConnector {
        async fn connect(&self, endpoint: &StoreEndpoint) -> StoreResult<StoreHandle> {
            self.attempts.lock().unwrap().push(endpoint.as_str().to_string());
            Err(StoreError::Connect {
                endpoint: endpoint.to_string(),
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            })
        }
    }

    /// Connects every attempt to a local listener standing in for the store.
    struct LoopbackConnector {
        addr: SocketAddr,
        attempts: Arc<AtomicUsize>,
    }

    impl StoreConnector for LoopbackConnector {
        async fn connect(&self, endpoint: &StoreEndpoint) -> StoreResult<StoreHandle> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let stream = TcpStream::connect(self.addr)
                .await
                .map_err(|source| StoreError::Connect {
                    endpoint: endpoint.to_string(),
                    source,
                })?;
            Ok(StoreHandle::new(endpoint.clone(), stream).unwrap())
        }
    }

    async fn loopback_store() -> (TcpListener, LoopbackConnector) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let connector = LoopbackConnector {
            addr: listener.local_addr().unwrap(),
            attempts: Arc::new(AtomicUsize::new(0)),
        };
        (listener, connector)
    }

    fn host_listener() -> ListenerHandle {
        ListenerHandle::new("127.0.0.1:3000".parse().unwrap(), UpgradeSlot::new())
    }

    type CallLog = Arc<std::sync::Mutex<Vec<String>>>;

    fn recording_options(log: &CallLog) -> BootstrapOptions {
        let store_log = log.clone();
        let transport_log = log.clone();
        BootstrapOptions::new()
            .on_store(move |store| {
                store_log
                    .lock()
                    .unwrap()
                    .push(format!("store:{}", store.peer_addr()));
            })
            .on_transport(move |transport| {
                transport_log
                    .lock()
                    .unwrap()
                    .push(format!("transport:{}", transport.local_addr()));
            })
    }

    #[test]
    fn test_validate_missing_store_closes_host_once() {
        let host = RecordingHost::default();
        let options = BootstrapOptions::new().on_transport(|_| {});

        let err = validate(&options, &host).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingCallback {
                callback: crate::bootstrap::Callback::Store
            }
        );
        assert_eq!(host.closes(), 1);
    }

    #[test]
    fn test_validate_missing_transport_closes_host_once() {
        let host = RecordingHost::default();
        let options = BootstrapOptions::new().on_store(|_| {});

        let err = validate(&options, &host).unwrap_err();
        assert!(err.to_string().contains("on_transport"));
        assert_eq!(host.closes(), 1);
    }

    #[test]
    fn test_validate_missing_both_closes_host_once() {
        let host = RecordingHost::default();
        assert!(validate(&BootstrapOptions::new(), &host).is_err());
        assert_eq!(host.closes(), 1);
    }

    #[test]
    fn test_validate_complete_options_is_silent() {
        let host = RecordingHost::default();
        let options = BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {});
        assert!(validate(&options, &host).is_ok());
        assert_eq!(host.closes(), 0);
    }

    #[test]
    fn test_new_rejects_missing_callback_before_connecting() {
        let host = RecordingHost::default();
        let connector = RefusingConnector::default();

        let result = Coordinator::new(
            BootstrapOptions::new().on_store(|_| {}),
            &SctcConfig::default(),
            connector.clone(),
            host.clone(),
        );

        assert!(matches!(result, Err(BootstrapError::Config(_))));
        assert_eq!(host.closes(), 1);
        assert!(connector.attempts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_new_rejects_bad_endpoint() {
        let host = RecordingHost::default();
        let mut config = SctcConfig::default();
        config.store.connection_string = "no scheme here".into();

        let result = Coordinator::new(
            BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {}),
            &config,
            RefusingConnector::default(),
            host.clone(),
        );

        assert!(matches!(result, Err(BootstrapError::InvalidEndpoint(_))));
        assert_eq!(host.closes(), 1);
    }

    #[tokio::test]
    async fn test_new_rejects_unmountable_transport_before_connecting() {
        let (_store, connector) = loopback_store().await;
        let attempts = connector.attempts.clone();
        let host = RecordingHost::default();
        let log = CallLog::default();
        let mut config = SctcConfig::default();
        config.transport.path = "//".into();

        let result = Coordinator::new(recording_options(&log), &config, connector, host.clone());

        assert!(matches!(
            result,
            Err(BootstrapError::InvalidTransport(TransportError::InvalidPath(_)))
        ));
        assert_eq!(host.closes(), 1);
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_new_rejects_zero_transport_sizes() {
        for (capacity, limit) in [(0, 1024), (16, 0)] {
            let host = RecordingHost::default();
            let mut config = SctcConfig::default();
            config.transport.channel_capacity = capacity;
            config.transport.max_message_bytes = limit;

            let result = Coordinator::new(
                BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {}),
                &config,
                RefusingConnector::default(),
                host.clone(),
            );

            assert!(matches!(result, Err(BootstrapError::InvalidTransport(_))));
            assert_eq!(host.closes(), 1);
        }
    }

    #[test]
    fn test_new_waits_for_ready() {
        let coordinator = Coordinator::new(
            BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {}),
            &SctcConfig::default(),
            RefusingConnector::default(),
            RecordingHost::default(),
        )
        .unwrap();
        assert_eq!(coordinator.phase(), Phase::AwaitingReady);
    }

    #[tokio::test]
    async fn test_success_hands_off_store_then_transport() {
        let (_store, connector) = loopback_store().await;
        let store_addr = connector.addr;
        let host = RecordingHost::default();
        let log = CallLog::default();
        let listener = host_listener();

        let coordinator =
            Coordinator::new(recording_options(&log), &SctcConfig::default(), connector, host.clone())
                .unwrap();
        let outcome = coordinator.on_ready(listener.clone()).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                format!("store:{}", store_addr),
                format!("transport:{}", listener.local_addr()),
            ]
        );
        assert_eq!(outcome.store_peer, store_addr);
        assert_eq!(outcome.transport_path, "/socket.io");
        assert_eq!(outcome.store_endpoint, "mongodb://localhost:27017");
        assert_eq!(coordinator.phase(), Phase::Ready);
        assert_eq!(host.closes(), 0);
        assert!(listener.upgrade_slot().get().is_some());
    }

    #[tokio::test]
    async fn test_store_failure_is_fatal_and_skips_consumers() {
        let host = RecordingHost::default();
        let log = CallLog::default();
        let listener = host_listener();

        let coordinator = Coordinator::new(
            recording_options(&log),
            &SctcConfig::default(),
            RefusingConnector::default(),
            host.clone(),
        )
        .unwrap();
        let err = coordinator.on_ready(listener.clone()).await.unwrap_err();

        assert!(matches!(err, BootstrapError::StoreAcquisitionFailed { .. }));
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(host.closes(), 1);
        assert_eq!(coordinator.phase(), Phase::Failed);
        assert!(listener.upgrade_slot().get().is_none());
    }

    #[tokio::test]
    async fn test_default_endpoint_is_attempted_verbatim() {
        let connector = RefusingConnector::default();
        let coordinator = Coordinator::new(
            BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {}),
            &SctcConfig::default().with_connection_override(None),
            connector.clone(),
            RecordingHost::default(),
        )
        .unwrap();

        let _ = coordinator.on_ready(host_listener()).await;

        assert_eq!(
            *connector.attempts.lock().unwrap(),
            vec!["mongodb://localhost:27017".to_string()]
        );
    }

    #[tokio::test]
    async fn test_repeated_ready_does_not_hand_off_twice() {
        let (_store, connector) = loopback_store().await;
        let attempts = connector.attempts.clone();
        let host = RecordingHost::default();
        let log = CallLog::default();

        let coordinator =
            Coordinator::new(recording_options(&log), &SctcConfig::default(), connector, host.clone())
                .unwrap();
        coordinator.on_ready(host_listener()).await.unwrap();
        let second = coordinator.on_ready(host_listener()).await.unwrap_err();

        assert!(matches!(
            second,
            BootstrapError::AlreadyStarted { phase: Phase::Ready }
        ));
        assert_eq!(log.lock().unwrap().len(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(host.closes(), 0);
    }

    #[tokio::test]
    async fn test_no_retry_after_failure() {
        let connector = RefusingConnector::default();
        let host = RecordingHost::default();
        let coordinator = Coordinator::new(
            BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {}),
            &SctcConfig::default(),
            connector.clone(),
            host.clone(),
        )
        .unwrap();

        let _ = coordinator.on_ready(host_listener()).await;
        let second = coordinator.on_ready(host_listener()).await.unwrap_err();

        assert!(matches!(
            second,
            BootstrapError::AlreadyStarted { phase: Phase::Failed }
        ));
        assert_eq!(connector.attempts.lock().unwrap().len(), 1);
        assert_eq!(host.closes(), 1);
    }

    #[tokio::test]
    async fn test_occupied_listener_fails_transport_attach() {
        let (_store, connector) = loopback_store().await;
        let host = RecordingHost::default();
        let log = CallLog::default();
        let listener = host_listener();
        listener
            .upgrade_slot()
            .install("/taken", axum::Router::new())
            .unwrap();

        let coordinator =
            Coordinator::new(recording_options(&log), &SctcConfig::default(), connector, host.clone())
                .unwrap();
        let err = coordinator.on_ready(listener).await.unwrap_err();

        assert!(matches!(err, BootstrapError::TransportAttachFailed(_)));
        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(host.closes(), 1);
        assert_eq!(coordinator.phase(), Phase::Failed);
    }

    #[tokio::test]
    async fn test_run_fails_when_host_never_ready() {
        let host = RecordingHost::default();
        let coordinator = Coordinator::new(
            BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {}),
            &SctcConfig::default(),
            RefusingConnector::default(),
            host.clone(),
        )
        .unwrap();

        let (notifier, subscription) = ready_channel();
        drop(notifier);

        let err = coordinator.run(subscription).await.unwrap_err();
        assert!(matches!(err, BootstrapError::ReadyChannelClosed));
        assert_eq!(host.closes(), 1);
    }

    #[tokio::test]
    async fn test_watch_observes_terminal_phase() {
        let (_store, connector) = loopback_store().await;
        let coordinator = Coordinator::new(
            BootstrapOptions::new().on_store(|_| {}).on_transport(|_| {}),
            &SctcConfig::default(),
            connector,
            RecordingHost::default(),
        )
        .unwrap();
        let mut phases = coordinator.watch();

        let (notifier, subscription) = ready_channel();
        notifier.notify(host_listener()).unwrap();
        coordinator.run(subscription).await.unwrap();

        let phase = *phases.wait_for(|p| p.is_terminal()).await.unwrap();
        assert_eq!(phase, Phase::Ready);
    }
}
