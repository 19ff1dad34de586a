//! Dispatcher metrics.
//!
//! Counters are plain atomics so concurrent publishers can update them
//! without coordination, and a monitoring collaborator can read them at any
//! time through [`BusMetrics::snapshot`].
//!
//! Latencies go into a fixed-bucket histogram. Percentiles are reported as the
//! upper bound of the bucket holding the requested rank, which is cheap and
//! accurate enough for a p95 budget check.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

use crate::error::HandlerError;
use crate::isolation::{HandlerResult, Outcome};

/// Bucket upper bounds in microseconds.
const BUCKET_BOUNDS_US: [u64; 20] = [
    10, 25, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 25_000, 50_000, 100_000, 250_000,
    500_000, 1_000_000, 2_500_000, 5_000_000, 10_000_000, u64::MAX,
];

/// Lock-free latency histogram.
#[derive(Debug)]
pub struct LatencyHistogram {
    buckets: [AtomicU64; BUCKET_BOUNDS_US.len()],
    count: AtomicU64,
    max_us: AtomicU64,
}

impl Default for LatencyHistogram {
    fn default() -> Self {
        Self {
            buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            count: AtomicU64::new(0),
            max_us: AtomicU64::new(0),
        }
    }
}

impl LatencyHistogram {
    pub fn record(&self, elapsed: Duration) {
        let us = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        let idx = BUCKET_BOUNDS_US
            .iter()
            .position(|bound| us <= *bound)
            .unwrap_or(BUCKET_BOUNDS_US.len() - 1);
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
        self.max_us.fetch_max(us, Ordering::Relaxed);
    }

    #[must_use]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    /// Estimated percentile (`q` in `0.0..=1.0`) in microseconds.
    ///
    /// Returns `None` when nothing has been recorded.
    #[must_use]
    pub fn percentile_us(&self, q: f64) -> Option<u64> {
        let counts: Vec<u64> = self.buckets.iter().map(|b| b.load(Ordering::Relaxed)).collect();
        let total: u64 = counts.iter().sum();
        if total == 0 {
            return None;
        }

        let q = q.clamp(0.0, 1.0);
        let rank = ((q * total as f64).ceil() as u64).max(1);
        let max_us = self.max_us.load(Ordering::Relaxed);

        let mut seen = 0;
        for (count, bound) in counts.iter().zip(BUCKET_BOUNDS_US) {
            seen += count;
            if seen >= rank {
                return Some(bound.min(max_us));
            }
        }
        Some(max_us)
    }
}

/// Counters for one bus instance.
#[derive(Debug, Default)]
pub struct BusMetrics {
    events_published: AtomicU64,
    events_rejected: AtomicU64,
    deliveries_succeeded: AtomicU64,
    deliveries_failed: AtomicU64,
    handler_timeouts: AtomicU64,
    queue_rejections: AtomicU64,
    dispatch_latency: LatencyHistogram,
    handler_latency: LatencyHistogram,
}

impl BusMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_published(&self) {
        self.events_published.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.events_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Dispatch overhead: validation + snapshot + scheduling, handler bodies excluded.
    pub(crate) fn record_dispatch(&self, overhead: Duration) {
        self.dispatch_latency.record(overhead);
    }

    pub(crate) fn record_result(&self, result: &HandlerResult) {
        self.handler_latency.record(result.duration);
        match &result.outcome {
            Outcome::Success => {
                self.deliveries_succeeded.fetch_add(1, Ordering::Relaxed);
            }
            Outcome::Failure(err) => {
                self.deliveries_failed.fetch_add(1, Ordering::Relaxed);
                match err {
                    HandlerError::Timeout { .. } => {
                        self.handler_timeouts.fetch_add(1, Ordering::Relaxed);
                    }
                    HandlerError::QueueFull => {
                        self.queue_rejections.fetch_add(1, Ordering::Relaxed);
                    }
                    _ => {}
                }
            }
        }
    }

    #[must_use]
    pub fn dispatch_latency(&self) -> &LatencyHistogram {
        &self.dispatch_latency
    }

    #[must_use]
    pub fn handler_latency(&self) -> &LatencyHistogram {
        &self.handler_latency
    }

    /// Point-in-time copy of every counter.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            events_published: self.events_published.load(Ordering::Relaxed),
            events_rejected: self.events_rejected.load(Ordering::Relaxed),
            deliveries_succeeded: self.deliveries_succeeded.load(Ordering::Relaxed),
            deliveries_failed: self.deliveries_failed.load(Ordering::Relaxed),
            handler_timeouts: self.handler_timeouts.load(Ordering::Relaxed),
            queue_rejections: self.queue_rejections.load(Ordering::Relaxed),
            dispatch_p95_us: self.dispatch_latency.percentile_us(0.95),
            handler_p95_us: self.handler_latency.percentile_us(0.95),
        }
    }
}

/// Serializable view of [`BusMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub events_published: u64,
    pub events_rejected: u64,
    pub deliveries_succeeded: u64,
    pub deliveries_failed: u64,
    pub handler_timeouts: u64,
    pub queue_rejections: u64,
    pub dispatch_p95_us: Option<u64>,
    pub handler_p95_us: Option<u64>,
}

impl MetricsSnapshot {
    /// Every handler invocation that produced a result.
    #[must_use]
    pub fn deliveries(&self) -> u64 {
        self.deliveries_succeeded + self.deliveries_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_histogram() {
        let hist = LatencyHistogram::default();
        assert_eq!(hist.count(), 0);
        assert!(hist.percentile_us(0.95).is_none());
    }

    #[test]
    fn test_percentile_picks_bucket_bound() {
        let hist = LatencyHistogram::default();
        for _ in 0..95 {
            hist.record(Duration::from_micros(40));
        }
        for _ in 0..5 {
            hist.record(Duration::from_millis(20));
        }

        assert_eq!(hist.count(), 100);
        assert_eq!(hist.percentile_us(0.95), Some(50));
        assert_eq!(hist.percentile_us(1.0), Some(20_000));
    }

    #[test]
    fn test_percentile_capped_by_max() {
        let hist = LatencyHistogram::default();
        hist.record(Duration::from_micros(120));
        // Bucket bound is 250us but nothing slower than 120us was observed.
        assert_eq!(hist.percentile_us(0.95), Some(120));
    }

    #[test]
    fn test_counters_snapshot() {
        let metrics = BusMetrics::new();
        metrics.record_published();
        metrics.record_published();
        metrics.record_rejected();
        metrics.record_dispatch(Duration::from_micros(30));

        let snap = metrics.snapshot();
        assert_eq!(snap.events_published, 2);
        assert_eq!(snap.events_rejected, 1);
        assert_eq!(snap.deliveries(), 0);
        assert_eq!(snap.dispatch_p95_us, Some(30));
        assert!(snap.handler_p95_us.is_none());
    }
}
