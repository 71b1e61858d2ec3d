//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sctc_bootstrap_total` (counter): bootstrap outcomes by `outcome`
//! - `sctc_store_connect_seconds` (histogram): store acquisition latency
//! - `sctc_transport_connections` (gauge): open transport connections
//! - `sctc_transport_messages_total` (counter): frames by `direction`
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - The Prometheus exporter is opt-in via `observability.metrics_enabled`

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record how a bootstrap attempt ended.
pub fn record_bootstrap(outcome: &'static str) {
    counter!("sctc_bootstrap_total", "outcome" => outcome).increment(1);
}

/// Record the time spent acquiring the store connection.
pub fn record_store_connect(start: Instant, success: bool) {
    let result = if success { "success" } else { "failure" };
    histogram!("sctc_store_connect_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}

pub fn set_transport_connections(count: usize) {
    gauge!("sctc_transport_connections").set(count as f64);
}

/// `direction` is `inbound` or `outbound`.
pub fn record_transport_message(direction: &'static str) {
    counter!("sctc_transport_messages_total", "direction" => direction).increment(1);
}
