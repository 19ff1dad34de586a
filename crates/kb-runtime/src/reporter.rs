//! Periodic copy of bus counters into the Prometheus registry.

use std::time::Duration;

use shared_bus::WeakEventBus;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Copy one snapshot now. Returns `false` if the bus is gone.
pub fn report_once(bus: &WeakEventBus) -> bool {
    let Some(bus) = bus.upgrade() else {
        return false;
    };
    let snapshot = bus.metrics().snapshot();
    kb_telemetry::record_bus_metrics(&snapshot, bus.in_flight());
    debug!(
        published = snapshot.events_published,
        rejected = snapshot.events_rejected,
        delivered = snapshot.deliveries(),
        failed = snapshot.deliveries_failed,
        dispatch_p95_us = snapshot.dispatch_p95_us.unwrap_or_default(),
        "Bus metrics reported"
    );
    true
}

/// Report every `interval` until `shutdown` flips to `true` or the bus is dropped.
pub fn spawn_reporter(
    bus: WeakEventBus,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !report_once(&bus) {
                        break;
                    }
                }
                _ = shutdown.changed() => {
                    // Final report so the last interval is not lost.
                    report_once(&bus);
                    info!("Metrics reporter stopped");
                    break;
                }
            }
        }
    })
}
