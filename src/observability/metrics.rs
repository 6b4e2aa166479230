//! Metrics collection and exposition.
//!
//! # Metrics
//! - `simulation_requests_total` (counter): simulation outcomes by kind, status
//! - `simulation_unhandled_panics_total` (counter): panics caught by the
//!   top-level middleware
//! - `http_request_duration_seconds` (histogram): latency by status code
//!
//! Recording is a no-op until [`init_metrics`] installs the recorder.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_simulation(kind: &'static str, status: u16) {
    metrics::counter!(
        "simulation_requests_total",
        "kind" => kind,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_panic() {
    metrics::counter!("simulation_unhandled_panics_total").increment(1);
}

pub fn record_request(status: u16, latency: Duration) {
    metrics::histogram!(
        "http_request_duration_seconds",
        "status" => status.to_string()
    )
    .record(latency.as_secs_f64());
}
