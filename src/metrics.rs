//! Prometheus metrics for scheduled actions and collaborator calls.
//!
//! This module provides metrics for:
//! - Scheduler ticks, failures, and action duration
//! - HTTP request and order submission latency
//! - Hedge orders and holder reports

use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use tracing::debug;

// === Metric Name Constants ===

/// Order submission latency metric name.
pub const METRIC_ORDER_SUBMIT_LATENCY: &str = "order_submit_latency_ms";
/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Signing latency metric name.
pub const METRIC_SIGNING_LATENCY: &str = "signing_latency_ms";
/// Scheduled action duration metric name.
pub const METRIC_ACTION_DURATION: &str = "scheduler_action_duration_ms";
/// Scheduler ticks counter metric name.
pub const METRIC_SCHEDULER_TICKS: &str = "scheduler_ticks_total";
/// Scheduler failures counter metric name.
pub const METRIC_SCHEDULER_FAILURES: &str = "scheduler_failures_total";
/// Closed-window fallbacks counter metric name.
pub const METRIC_WINDOW_FALLBACKS: &str = "window_fallbacks_total";
/// Orders submitted counter metric name.
pub const METRIC_ORDERS_SUBMITTED: &str = "orders_submitted_total";
/// Orders failed counter metric name.
pub const METRIC_ORDERS_FAILED: &str = "orders_failed_total";
/// Holder reports counter metric name.
pub const METRIC_HOLDER_REPORTS: &str = "holder_reports_total";
/// Rejected holder records counter metric name.
pub const METRIC_HOLDERS_REJECTED: &str = "holder_records_rejected_total";

/// Initialize all metric descriptions.
/// Call this once at startup, after installing a recorder.
pub fn init_metrics() {
    // Latency histograms
    describe_histogram!(
        METRIC_ORDER_SUBMIT_LATENCY,
        "Order submission latency in milliseconds"
    );
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_SIGNING_LATENCY,
        "Cryptographic signing latency in milliseconds"
    );
    describe_histogram!(
        METRIC_ACTION_DURATION,
        "Duration of one scheduled action invocation in milliseconds"
    );

    // Counters
    describe_counter!(METRIC_SCHEDULER_TICKS, "Total number of scheduler ticks");
    describe_counter!(
        METRIC_SCHEDULER_FAILURES,
        "Total number of failed scheduled invocations"
    );
    describe_counter!(
        METRIC_WINDOW_FALLBACKS,
        "Times a stale window was reused after discovery failed"
    );
    describe_counter!(METRIC_ORDERS_SUBMITTED, "Total number of orders submitted");
    describe_counter!(METRIC_ORDERS_FAILED, "Total number of orders that failed");
    describe_counter!(METRIC_HOLDER_REPORTS, "Total number of holder reports rendered");
    describe_counter!(
        METRIC_HOLDERS_REJECTED,
        "Total number of holder records rejected by validation"
    );

    debug!("Metrics initialized");
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
}

/// Record how long one scheduled invocation took.
pub fn record_action_duration(start: Instant, action: &'static str) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_ACTION_DURATION, "action" => action).record(latency_ms);
}

/// Increment scheduler tick counter.
pub fn inc_scheduler_ticks(action: &'static str) {
    counter!(METRIC_SCHEDULER_TICKS, "action" => action).increment(1);
}

/// Increment scheduler failure counter.
pub fn inc_scheduler_failures(action: &'static str, kind: &'static str) {
    counter!(METRIC_SCHEDULER_FAILURES, "action" => action, "kind" => kind).increment(1);
}

/// Increment stale-window fallback counter.
pub fn inc_window_fallbacks() {
    counter!(METRIC_WINDOW_FALLBACKS).increment(1);
}

/// Increment order submitted counter.
pub fn inc_orders_submitted() {
    counter!(METRIC_ORDERS_SUBMITTED).increment(1);
}

/// Increment orders failed counter.
pub fn inc_orders_failed() {
    counter!(METRIC_ORDERS_FAILED).increment(1);
}

/// Increment holder report counter.
pub fn inc_holder_reports() {
    counter!(METRIC_HOLDER_REPORTS).increment(1);
}

/// Add to the rejected holder record counter.
pub fn add_holders_rejected(count: usize) {
    counter!(METRIC_HOLDERS_REJECTED).increment(count as u64);
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        histogram!(self.metric_name).record(self.elapsed_ms());
    }
}

/// Create a latency timer for order submission.
pub fn timer_order_submit() -> LatencyTimer {
    LatencyTimer::new(METRIC_ORDER_SUBMIT_LATENCY)
}

/// Create a latency timer for signing operations.
pub fn timer_signing() -> LatencyTimer {
    LatencyTimer::new(METRIC_SIGNING_LATENCY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn latency_timer_measures_time() {
        let timer = timer_signing();
        sleep(Duration::from_millis(10));
        assert!(timer.elapsed_ms() >= 9.0);
    }

    #[test]
    fn recording_without_recorder_is_a_no_op() {
        init_metrics();
        inc_scheduler_ticks("test");
        inc_scheduler_failures("test", "network");
        record_action_duration(Instant::now(), "test");
        add_holders_rejected(3);
    }
}
