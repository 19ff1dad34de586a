//! # Runtime Configuration
//!
//! Unified configuration for the event bus, telemetry and runtime timers.
//! Every value has a default and an environment override.

use std::env;
use std::time::Duration;

use kb_telemetry::TelemetryConfig;
use shared_bus::{BusConfig, BusError};

/// Default interval between metrics reporter ticks.
pub const DEFAULT_METRICS_INTERVAL: Duration = Duration::from_secs(15);

/// Default time allowed for in-flight async deliveries on shutdown.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Event bus worker pool and deadlines.
    pub bus: BusConfig,
    /// Logging configuration.
    pub telemetry: TelemetryConfig,
    /// How often bus counters are copied into Prometheus gauges.
    pub metrics_interval: Duration,
    /// How long shutdown waits for async deliveries to drain.
    pub shutdown_grace: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            bus: BusConfig::default(),
            telemetry: TelemetryConfig::default(),
            metrics_interval: DEFAULT_METRICS_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl RuntimeConfig {
    /// Load from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `KB_METRICS_INTERVAL_SECS`: reporter interval (default: 15)
    /// - `KB_SHUTDOWN_GRACE_SECS`: drain timeout on shutdown (default: 5)
    /// - plus everything read by [`BusConfig::from_env`] and
    ///   [`TelemetryConfig::from_env`]
    pub fn from_env() -> Self {
        Self {
            bus: BusConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            metrics_interval: env_secs("KB_METRICS_INTERVAL_SECS")
                .unwrap_or(DEFAULT_METRICS_INTERVAL),
            shutdown_grace: env_secs("KB_SHUTDOWN_GRACE_SECS").unwrap_or(DEFAULT_SHUTDOWN_GRACE),
        }
    }

    /// # Errors
    ///
    /// [`BusError::InvalidConfig`] for a bad bus setting or a zero metrics interval.
    pub fn validate(&self) -> Result<(), BusError> {
        self.bus.validate()?;
        if self.metrics_interval.is_zero() {
            return Err(BusError::InvalidConfig(
                "metrics_interval must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .map(Duration::from_secs)
}
