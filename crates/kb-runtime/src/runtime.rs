//! # Knowledge Runtime
//!
//! Owns the single [`EventBus`] and drives the startup and shutdown
//! sequences.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Create the event bus (worker pool on the current Tokio runtime)
//! 3. Register the domain event catalog
//! 4. Run every module's registration function in `ModuleId::INIT_ORDER`
//! 5. Start the metrics reporter

use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use shared_bus::EventBus;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::activity::ActivityLog;
use crate::config::RuntimeConfig;
use crate::modules::ModuleContext;
use crate::reporter;
use crate::wiring::{self, ModuleRegistration};

/// The composition root.
pub struct KnowledgeRuntime {
    config: RuntimeConfig,
    bus: EventBus,
    activity: Arc<ActivityLog>,
    registrations: Vec<ModuleRegistration>,
    reporter: Mutex<Option<JoinHandle<()>>>,
    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,
}

impl KnowledgeRuntime {
    /// Build the bus and register every module.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Invalid configuration, no runtime, or a registration error.
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        config.validate().context("Invalid runtime configuration")?;

        let bus = EventBus::new(config.bus.clone()).context("Failed to create event bus")?;
        let activity = Arc::new(ActivityLog::new());
        let ctx = ModuleContext::new(bus.clone(), Arc::clone(&activity));

        let registrations = wiring::register_all(&ctx).context("Module registration failed")?;

        let (shutdown_tx, _) = watch::channel(false);

        info!(
            modules = registrations.len(),
            events = bus.catalog().len(),
            subscriptions = bus.registry().len(),
            "Knowledge runtime created"
        );

        Ok(Self {
            config,
            bus,
            activity,
            registrations,
            reporter: Mutex::new(None),
            shutdown_tx,
        })
    }

    /// Start background tasks.
    pub fn start(&self) {
        let mut slot = self.reporter.lock();
        if slot.is_some() {
            warn!("Runtime already started");
            return;
        }
        *slot = Some(reporter::spawn_reporter(
            self.bus.downgrade(),
            self.config.metrics_interval,
            self.shutdown_tx.subscribe(),
        ));
        info!(
            interval_secs = self.config.metrics_interval.as_secs(),
            "Metrics reporter started"
        );
    }

    /// Shut down gracefully.
    ///
    /// ## Shutdown Sequence
    ///
    /// 1. Wait up to `shutdown_grace` for in-flight async deliveries
    /// 2. Close the worker pool
    /// 3. Stop the reporter after its final report
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");

        if tokio::time::timeout(self.config.shutdown_grace, self.bus.wait_idle())
            .await
            .is_err()
        {
            warn!(
                in_flight = self.bus.in_flight(),
                "Grace period elapsed with async deliveries still running"
            );
        }
        self.bus.shutdown().await;

        if let Err(e) = self.shutdown_tx.send(true) {
            // No receiver: the reporter was never started.
            tracing::debug!(error = %e, "No shutdown listeners");
        }
        let handle = self.reporter.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!(error = %e, "Metrics reporter panicked");
            }
        }

        info!("Shutdown complete");
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    #[must_use]
    pub fn registrations(&self) -> &[ModuleRegistration] {
        &self.registrations
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }
}
