//! Application metrics for Prometheus monitoring.
//!
//! This module provides:
//! - Prometheus metrics recorder initialization
//! - Metric definitions (counters, histograms, gauges)
//! - Helper functions for recording job and request metrics

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Instant;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// Safe to call from several threads: every caller returns only after the
/// handle is stored. Returns `true` for the call that installed the recorder.
pub fn init_metrics() -> bool {
    let mut installed = false;
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();

        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("Failed to set global metrics recorder (already set)");
        } else {
            describe_metrics();
            tracing::info!("Prometheus metrics initialized");
            installed = true;
        }
        handle
    });
    installed
}

fn describe_metrics() {
    describe_counter!("http_requests_total", "Total number of API requests by endpoint");
    describe_histogram!(
        "http_request_duration_seconds",
        "Duration of API requests in seconds"
    );

    describe_counter!("download_jobs_started_total", "Download jobs accepted, by format");
    describe_counter!("download_jobs_finished_total", "Download jobs that reached finished");
    describe_counter!("download_jobs_failed_total", "Download jobs that reached error");
    describe_counter!(
        "download_items_total",
        "Media items processed, by result (ok or failed)"
    );
    describe_gauge!("download_workers_active", "Workers currently downloading");
}

/// Render current metrics in Prometheus text format.
///
/// Returns `None` if metrics are not initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub fn record_job_started(format: &str) {
    counter!("download_jobs_started_total", "format" => format.to_string()).increment(1);
}

/// Failed playlist items are counted as they happen by `record_item_failed`.
pub fn record_job_finished(succeeded: u32) {
    counter!("download_jobs_finished_total").increment(1);
    counter!("download_items_total", "result" => "ok").increment(u64::from(succeeded));
}

pub fn record_job_failed() {
    counter!("download_jobs_failed_total").increment(1);
}

pub fn record_item_failed() {
    counter!("download_items_total", "result" => "failed").increment(1);
}

pub fn worker_started() {
    gauge!("download_workers_active").increment(1.0);
}

pub fn worker_stopped() {
    gauge!("download_workers_active").decrement(1.0);
}

/// Record a completed API request.
pub fn record_request(endpoint: &str, status: &str, duration: std::time::Duration) {
    counter!("http_requests_total", "endpoint" => endpoint.to_string(), "status" => status.to_string())
        .increment(1);
    histogram!("http_request_duration_seconds", "endpoint" => endpoint.to_string())
        .record(duration.as_secs_f64());
}

/// Helper for timing request handlers.
///
/// Usage:
/// ```ignore
/// let timer = RequestTimer::new("progress");
/// // ... do work ...
/// timer.finish(200);
/// ```
pub struct RequestTimer {
    endpoint: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(endpoint: &'static str) -> Self {
        Self {
            endpoint,
            start: Instant::now(),
        }
    }

    pub fn finish(self, status: u16) {
        record_request(self.endpoint, &status.to_string(), self.start.elapsed());
    }
}
