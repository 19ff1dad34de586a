//! # KB Telemetry
//!
//! Observability plumbing shared by the runtime and the tools.
//!
//! - **Logs**: `tracing` with an `EnvFilter`, pretty or JSON, to stderr.
//! - **Metrics**: Prometheus gauges mirroring the event bus counters, plus a
//!   per-module handled-events counter.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kb_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::from_env();
//! init_telemetry(&config)?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | unset | Full filter directive, wins over `KB_LOG_LEVEL` |
//! | `KB_LOG_LEVEL` | `info` | Log level filter |
//! | `KB_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `KB_CONSOLE_OUTPUT` | `true` | Write logs at all |
//! | `KB_SERVICE_NAME` | `knowledge-base` | Service name |

mod config;
mod logging;
mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, record_bus_metrics, record_module_event, register_metrics, ASYNC_IN_FLIGHT,
    DELIVERIES_FAILED, DELIVERIES_SUCCEEDED, DISPATCH_P95, EVENTS_PUBLISHED, EVENTS_REJECTED,
    HANDLER_P95, HANDLER_TIMEOUTS, MODULE_EVENTS_HANDLED, QUEUE_REJECTIONS, REGISTRY,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("A global tracing subscriber is already installed")]
    AlreadyInitialised,
}

/// Install logging and register metrics.
///
/// # Errors
///
/// Propagates [`init_logging`] and [`register_metrics`] failures.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    register_metrics()?;
    init_logging(config)?;
    tracing::info!(service = %config.service_name, "Telemetry initialised");
    Ok(())
}
