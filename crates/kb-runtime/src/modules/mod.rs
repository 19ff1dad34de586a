//! # Domain Module Registrations
//!
//! One file per domain module. Each exposes a single typed function,
//! `subscribe(&ModuleContext)`, that attaches the module's handlers to the
//! bus. Modules never call one another: a module that reacts to another's
//! work subscribes to the event that work publishes.
//!
//! ```text
//! resource.created ──► search (sync)  ──► search.index_updated
//!                  ├─► quality (async)
//!                  ├─► taxonomy (async)
//!                  └─► ingestion (async) ──► ingestion.completed ──► resources
//!                                                                └─► scholarly ──► citation.extracted ──► graph ──► graph.updated
//! ```

use std::sync::Arc;

use shared_bus::{BusError, Event, EventBus, Handler, SubscriptionId, WeakEventBus};
use shared_types::ModuleId;

use crate::activity::ActivityLog;

pub mod annotations;
pub mod authority;
pub mod collections;
pub mod curation;
pub mod graph;
pub mod ingestion;
pub mod monitoring;
pub mod quality;
pub mod recommendations;
pub mod resources;
pub mod scholarly;
pub mod search;
pub mod taxonomy;

/// What a module registration function receives.
#[derive(Debug, Clone)]
pub struct ModuleContext {
    bus: EventBus,
    activity: Arc<ActivityLog>,
}

impl ModuleContext {
    #[must_use]
    pub fn new(bus: EventBus, activity: Arc<ActivityLog>) -> Self {
        Self { bus, activity }
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Handle for handlers that publish follow-up events.
    #[must_use]
    pub fn publisher(&self) -> WeakEventBus {
        self.bus.downgrade()
    }

    #[must_use]
    pub fn activity(&self) -> Arc<ActivityLog> {
        Arc::clone(&self.activity)
    }

    /// Subscribe a sync handler that only records the event.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownEvent`] if `event_name` is not in the catalog.
    pub fn observe(
        &self,
        module: ModuleId,
        action: &str,
        event_name: &str,
    ) -> Result<SubscriptionId, BusError> {
        let activity = self.activity();
        self.bus.subscribe(
            event_name,
            Handler::sync(handler_identity(module, action), move |event| {
                activity.record(module, event);
                Ok(())
            }),
        )
    }
}

/// `module::action`, the identity used in logs and handler results.
#[must_use]
pub fn handler_identity(module: ModuleId, action: &str) -> String {
    format!("{}::{action}", module.name())
}

/// Publish a follow-up event through a weak handle.
///
/// A bus that is already gone is not an error: the process is shutting down.
pub(crate) fn publish_follow_up(publisher: &WeakEventBus, event: Event) -> anyhow::Result<()> {
    let Some(bus) = publisher.upgrade() else {
        return Ok(());
    };
    bus.publish(event)?;
    Ok(())
}

/// Registration function signature shared by every module.
pub type RegisterFn = fn(&ModuleContext) -> Result<Vec<SubscriptionId>, BusError>;

/// The registration function for `module`.
#[must_use]
pub fn registration_for(module: ModuleId) -> RegisterFn {
    match module {
        ModuleId::Resources => resources::subscribe,
        ModuleId::Ingestion => ingestion::subscribe,
        ModuleId::Collections => collections::subscribe,
        ModuleId::Annotations => annotations::subscribe,
        ModuleId::Search => search::subscribe,
        ModuleId::Quality => quality::subscribe,
        ModuleId::Taxonomy => taxonomy::subscribe,
        ModuleId::Graph => graph::subscribe,
        ModuleId::Scholarly => scholarly::subscribe,
        ModuleId::Recommendations => recommendations::subscribe,
        ModuleId::Curation => curation::subscribe,
        ModuleId::Authority => authority::subscribe,
        ModuleId::Monitoring => monitoring::subscribe,
    }
}
