//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_admissions_total` (counter): verdicts by outcome
//! - `gateway_rejections_total` (counter): rejections by machine code
//! - `gateway_rate_limit_windows` (gauge): tracked (identity, endpoint) windows
//! - `gateway_rate_limit_evictions_total` (counter): windows removed by the sweeper
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency by status
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admission(outcome: &'static str) {
    counter!("gateway_admissions_total", "outcome" => outcome).increment(1);
}

pub fn record_rejection(code: &'static str) {
    counter!("gateway_rejections_total", "code" => code).increment(1);
}

pub fn record_rate_limit_windows(tracked: usize, evicted: usize) {
    gauge!("gateway_rate_limit_windows").set(tracked as f64);
    counter!("gateway_rate_limit_evictions_total").increment(evicted as u64);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}
