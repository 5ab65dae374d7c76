//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define bridge metrics (connections, frames, pump exits, failures)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `bridge_connections_total` (counter): upgraded connections
//! - `bridge_active_connections` (gauge): connections with a running pump
//! - `bridge_frames_received_total` (counter): frames delivered to inbound queues
//! - `bridge_frames_sent_total` (counter): frames written by outbound pumps
//! - `bridge_pump_exits_total` (counter): pump terminations by pump and reason
//! - `bridge_upgrade_failures_total` (counter): rejected or failed upgrades
//! - `bridge_endpoint_failures_total` (counter): endpoint setup failures
//!
//! # Design Decisions
//! - Uses the `metrics` facade; without an installed recorder every call is a no-op
//! - Label values are static strings to keep cardinality bounded

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its HTTP scrape listener.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter")
        }
    }
}

pub fn record_connection_opened() {
    metrics::counter!("bridge_connections_total").increment(1);
    metrics::gauge!("bridge_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    metrics::gauge!("bridge_active_connections").decrement(1.0);
}

pub fn record_frame_received() {
    metrics::counter!("bridge_frames_received_total").increment(1);
}

pub fn record_frame_sent() {
    metrics::counter!("bridge_frames_sent_total").increment(1);
}

/// Record a pump termination. `pump` is `inbound` or `outbound`.
pub fn record_pump_exit(pump: &'static str, reason: &'static str) {
    metrics::counter!("bridge_pump_exits_total", "pump" => pump, "reason" => reason).increment(1);
}

pub fn record_upgrade_failure() {
    metrics::counter!("bridge_upgrade_failures_total").increment(1);
}

pub fn record_endpoint_failure() {
    metrics::counter!("bridge_endpoint_failures_total").increment(1);
}
