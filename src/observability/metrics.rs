//! Metrics collection and exposition.
//!
//! # Metrics
//! - `datastore_requests_total` (counter): requests by method, status
//! - `datastore_request_duration_seconds` (histogram): handling latency
//! - `datastore_rows_inserted_total` (counter): rows made durable
//! - `datastore_accept_errors_total` (counter): failed accepts
//! - `datastore_queue_depth` (gauge): connections waiting for a worker
//! - `datastore_bootstrap_attempts_total` (counter): startup connect attempts
//!
//! Recording is a no-op until a recorder is installed, so tests and the
//! default configuration pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    counter!(
        "datastore_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("datastore_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_rows_inserted(rows: usize) {
    counter!("datastore_rows_inserted_total").increment(rows as u64);
}

pub fn record_accept_error() {
    counter!("datastore_accept_errors_total").increment(1);
}

pub fn set_queue_depth(depth: usize) {
    gauge!("datastore_queue_depth").set(depth as f64);
}

pub fn record_bootstrap_attempt() {
    counter!("datastore_bootstrap_attempts_total").increment(1);
}
