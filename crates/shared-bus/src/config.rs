//! Bus configuration.

use std::env;
use std::time::Duration;

use crate::error::BusError;

/// Default bound on the async delivery queue.
pub const DEFAULT_QUEUE_DEPTH: usize = 1024;

/// Default per-handler execution deadline.
pub const DEFAULT_HANDLER_TIMEOUT: Duration = Duration::from_secs(30);

/// Tuning knobs for the delivery engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusConfig {
    /// Number of async delivery workers.
    pub worker_pool_size: usize,
    /// Async submissions beyond this many queued jobs are rejected with `QueueFull`.
    pub queue_depth: usize,
    /// Deadline for handlers that do not set their own.
    pub handler_timeout: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: num_cpus::get().max(1),
            queue_depth: DEFAULT_QUEUE_DEPTH,
            handler_timeout: DEFAULT_HANDLER_TIMEOUT,
        }
    }
}

impl BusConfig {
    /// Load from `KB_BUS_WORKERS`, `KB_BUS_QUEUE_DEPTH` and
    /// `KB_HANDLER_TIMEOUT_MS`, falling back to defaults for unset or
    /// unparseable values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            worker_pool_size: env_parse("KB_BUS_WORKERS").unwrap_or(defaults.worker_pool_size),
            queue_depth: env_parse("KB_BUS_QUEUE_DEPTH").unwrap_or(defaults.queue_depth),
            handler_timeout: env_parse("KB_HANDLER_TIMEOUT_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.handler_timeout),
        }
    }

    #[must_use]
    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    #[must_use]
    pub fn with_queue_depth(mut self, depth: usize) -> Self {
        self.queue_depth = depth;
        self
    }

    #[must_use]
    pub fn with_handler_timeout(mut self, timeout: Duration) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// # Errors
    ///
    /// [`BusError::InvalidConfig`] when any knob is zero.
    pub fn validate(&self) -> Result<(), BusError> {
        if self.worker_pool_size == 0 {
            return Err(BusError::InvalidConfig("worker_pool_size must be at least 1".into()));
        }
        if self.queue_depth == 0 {
            return Err(BusError::InvalidConfig("queue_depth must be at least 1".into()));
        }
        if self.handler_timeout.is_zero() {
            return Err(BusError::InvalidConfig("handler_timeout must be non-zero".into()));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.trim().parse().ok())
}
