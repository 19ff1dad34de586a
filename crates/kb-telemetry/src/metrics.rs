//! Prometheus metrics for the event bus.
//!
//! All metrics follow the naming convention: `kb_<component>_<metric>_<unit>`
//!
//! The bus keeps its own atomic counters. A reporter copies a
//! [`MetricsSnapshot`] into these collectors on an interval, and the
//! monitoring endpoint serves [`encode_metrics`]. Cumulative bus counts are
//! exported as counters (`*_total`); point-in-time values as gauges.

use lazy_static::lazy_static;
use prometheus::{
    Encoder, Gauge, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use shared_bus::MetricsSnapshot;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // EVENT BUS METRICS
    // =========================================================================

    /// Events accepted by `publish`
    pub static ref EVENTS_PUBLISHED: IntCounter = IntCounter::new(
        "kb_eventbus_events_published_total",
        "Events accepted by the dispatcher"
    ).expect("metric creation failed");

    /// Events rejected by catalog validation
    pub static ref EVENTS_REJECTED: IntCounter = IntCounter::new(
        "kb_eventbus_events_rejected_total",
        "Publishes rejected as unknown or malformed"
    ).expect("metric creation failed");

    /// Successful handler invocations
    pub static ref DELIVERIES_SUCCEEDED: IntCounter = IntCounter::new(
        "kb_eventbus_deliveries_succeeded_total",
        "Handler invocations that completed successfully"
    ).expect("metric creation failed");

    /// Failed handler invocations (errors, panics, timeouts, rejections)
    pub static ref DELIVERIES_FAILED: IntCounter = IntCounter::new(
        "kb_eventbus_deliveries_failed_total",
        "Handler invocations that failed"
    ).expect("metric creation failed");

    /// Handler deadline overruns
    pub static ref HANDLER_TIMEOUTS: IntCounter = IntCounter::new(
        "kb_eventbus_handler_timeouts_total",
        "Handler invocations that exceeded their deadline"
    ).expect("metric creation failed");

    /// Async submissions rejected by a full queue
    pub static ref QUEUE_REJECTIONS: IntCounter = IntCounter::new(
        "kb_eventbus_queue_rejections_total",
        "Async deliveries rejected because the worker queue was full"
    ).expect("metric creation failed");

    /// Async deliveries accepted and not yet finished
    pub static ref ASYNC_IN_FLIGHT: IntGauge = IntGauge::new(
        "kb_eventbus_async_in_flight",
        "Async deliveries currently queued or running"
    ).expect("metric creation failed");

    /// p95 dispatch overhead
    pub static ref DISPATCH_P95: Gauge = Gauge::new(
        "kb_eventbus_dispatch_p95_seconds",
        "95th percentile dispatch overhead, handler bodies excluded"
    ).expect("metric creation failed");

    /// p95 handler duration
    pub static ref HANDLER_P95: Gauge = Gauge::new(
        "kb_eventbus_handler_p95_seconds",
        "95th percentile handler execution time"
    ).expect("metric creation failed");

    // =========================================================================
    // MODULE METRICS
    // =========================================================================

    /// Events observed per module
    pub static ref MODULE_EVENTS_HANDLED: IntCounterVec = IntCounterVec::new(
        Opts::new("kb_module_events_handled_total", "Events handled by each domain module"),
        &["module", "event"]
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
///
/// # Errors
///
/// [`TelemetryError::MetricsInit`] if a collector is rejected for any reason
/// other than already being registered.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(EVENTS_PUBLISHED.clone()),
        Box::new(EVENTS_REJECTED.clone()),
        Box::new(DELIVERIES_SUCCEEDED.clone()),
        Box::new(DELIVERIES_FAILED.clone()),
        Box::new(HANDLER_TIMEOUTS.clone()),
        Box::new(QUEUE_REJECTIONS.clone()),
        Box::new(ASYNC_IN_FLIGHT.clone()),
        Box::new(DISPATCH_P95.clone()),
        Box::new(HANDLER_P95.clone()),
        Box::new(MODULE_EVENTS_HANDLED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(())
}

/// Copy a bus snapshot into the Prometheus collectors.
pub fn record_bus_metrics(snapshot: &MetricsSnapshot, in_flight: usize) {
    advance(&EVENTS_PUBLISHED, snapshot.events_published);
    advance(&EVENTS_REJECTED, snapshot.events_rejected);
    advance(&DELIVERIES_SUCCEEDED, snapshot.deliveries_succeeded);
    advance(&DELIVERIES_FAILED, snapshot.deliveries_failed);
    advance(&HANDLER_TIMEOUTS, snapshot.handler_timeouts);
    advance(&QUEUE_REJECTIONS, snapshot.queue_rejections);
    ASYNC_IN_FLIGHT.set(i64::try_from(in_flight).unwrap_or(i64::MAX));
    DISPATCH_P95.set(micros_to_secs(snapshot.dispatch_p95_us));
    HANDLER_P95.set(micros_to_secs(snapshot.handler_p95_us));
}

/// Count one event handled by `module`.
pub fn record_module_event(module: &str, event: &str) {
    MODULE_EVENTS_HANDLED.with_label_values(&[module, event]).inc();
}

/// Encode all metrics as Prometheus text format.
///
/// # Errors
///
/// [`TelemetryError::MetricsInit`] if encoding fails.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Raise `counter` to the bus's running total. Counters never go down.
fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

fn micros_to_secs(us: Option<u64>) -> f64 {
    us.map_or(0.0, |us| us as f64 / 1_000_000.0)
}
