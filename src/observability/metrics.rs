//! Metrics collection and exposition.
//!
//! # Metrics
//! - `origin_guard_decisions_total` (counter): origin decisions by `outcome`
//!   (`no_origin`, `matched`, `malformed`, `opaque`, `not_allowed`)
//! - `origin_guard_connections_total` (counter): upgraded WebSocket sessions
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed, so library users
//!   and tests pay nothing
//! - Prometheus exporter is only started by the binary

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Count one origin decision.
pub fn record_origin_decision(outcome: &'static str) {
    metrics::counter!("origin_guard_decisions_total", "outcome" => outcome).increment(1);
}

/// Count one upgraded WebSocket session.
pub fn record_connection() {
    metrics::counter!("origin_guard_connections_total").increment(1);
}
