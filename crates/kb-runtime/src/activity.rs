//! Per-module record of handled events.
//!
//! Handler bodies in this crate are observers: the domain work behind them
//! lives outside the event core. What they do record is which module saw
//! which event, which is what startup checks, tests and dashboards need.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use shared_bus::Event;
use shared_types::ModuleId;

/// Thread-safe `(module, event) -> count` table.
#[derive(Debug, Default)]
pub struct ActivityLog {
    counts: Mutex<BTreeMap<(ModuleId, String), u64>>,
}

impl ActivityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count `event` as handled by `module` and mirror it to Prometheus.
    pub fn record(&self, module: ModuleId, event: &Event) {
        *self
            .counts
            .lock()
            .entry((module, event.name().to_string()))
            .or_insert(0) += 1;
        kb_telemetry::record_module_event(module.name(), event.name());
    }

    #[must_use]
    pub fn count(&self, module: ModuleId, event_name: &str) -> u64 {
        self.counts
            .lock()
            .get(&(module, event_name.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Events handled by `module` across all names.
    #[must_use]
    pub fn total_for(&self, module: ModuleId) -> u64 {
        self.counts
            .lock()
            .iter()
            .filter(|((m, _), _)| *m == module)
            .map(|(_, count)| count)
            .sum()
    }

    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<(ModuleId, String), u64> {
        self.counts.lock().clone()
    }
}
