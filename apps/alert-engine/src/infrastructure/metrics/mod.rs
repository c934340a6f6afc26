//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Pipeline**: Alerts evaluated and fired, notifications delivered
//! - **Cache**: Hit and miss counts for the quote cache
//! - **Gateway**: Failed quote lookups against the market data provider
//! - **Connections**: Live WebSocket notification channels
//! - **Latency**: Evaluation cycle duration
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the HTTP server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    // Pipeline counters
    describe_counter!(
        "alert_engine_alerts_evaluated_total",
        "Total active alerts examined across all cycles"
    );
    describe_counter!(
        "alert_engine_alerts_fired_total",
        "Total alert events fired (price within tolerance)"
    );
    describe_counter!(
        "alert_engine_notifications_sent_total",
        "Total notification messages handed to live connections"
    );

    // Cache counters
    describe_counter!(
        "alert_engine_cache_hits_total",
        "Quote cache lookups answered from cache"
    );
    describe_counter!(
        "alert_engine_cache_misses_total",
        "Quote cache lookups that fell through to the gateway"
    );

    // Gateway counters
    describe_counter!(
        "alert_engine_gateway_failures_total",
        "Quote lookups that failed at the market data provider"
    );

    // Connection gauge
    describe_gauge!(
        "alert_engine_ws_connections",
        "Number of live WebSocket notification connections"
    );

    // Latency histogram
    describe_histogram!(
        "alert_engine_cycle_duration_seconds",
        "Wall-clock duration of one evaluate-then-dispatch cycle"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record alerts examined in a cycle.
pub fn record_alerts_evaluated(count: u64) {
    counter!("alert_engine_alerts_evaluated_total").increment(count);
}

/// Record alert events fired in a cycle.
pub fn record_alerts_fired(count: u64) {
    counter!("alert_engine_alerts_fired_total").increment(count);
}

/// Record notification messages handed to connections.
pub fn record_notifications_sent(count: u64) {
    counter!("alert_engine_notifications_sent_total").increment(count);
}

/// Record a quote cache hit.
pub fn record_cache_hit() {
    counter!("alert_engine_cache_hits_total").increment(1);
}

/// Record a quote cache miss.
pub fn record_cache_miss() {
    counter!("alert_engine_cache_misses_total").increment(1);
}

/// Record a failed quote lookup at the provider.
pub fn record_gateway_failure() {
    counter!("alert_engine_gateway_failures_total").increment(1);
}

/// Update the live WebSocket connection count.
pub fn set_ws_connections(count: f64) {
    gauge!("alert_engine_ws_connections").set(count);
}

/// Record the duration of one evaluation cycle.
pub fn record_cycle_duration(duration: Duration) {
    histogram!("alert_engine_cycle_duration_seconds").record(duration.as_secs_f64());
}
