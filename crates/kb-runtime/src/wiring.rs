//! # Wiring
//!
//! Startup registration, in two passes over [`ModuleId::INIT_ORDER`]:
//!
//! 1. every module registers the catalog entries it owns;
//! 2. every module runs its registration function.
//!
//! Splitting the passes means a module may subscribe to an event whose
//! owner comes later in the order.

use shared_bus::{BusError, EventBus, EventSchema, SubscriptionId};
use shared_types::{definitions_owned_by, EventDefinition, ModuleId};
use tracing::{debug, info};

use crate::modules::{registration_for, ModuleContext};

/// Result of registering one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRegistration {
    pub module: ModuleId,
    pub events_owned: usize,
    pub subscriptions: Vec<SubscriptionId>,
}

/// Catalog schema for a declarative definition.
#[must_use]
pub fn schema_for(definition: &EventDefinition) -> EventSchema {
    EventSchema::new(definition.name)
        .required(definition.required.iter().copied())
        .optional(definition.optional.iter().copied())
}

/// Register the catalog entries owned by `module`.
///
/// # Errors
///
/// [`BusError::DuplicateEvent`] if an entry clashes with one already registered.
pub fn register_events(bus: &EventBus, module: ModuleId) -> Result<usize, BusError> {
    let mut count = 0;
    for definition in definitions_owned_by(module) {
        bus.register_event(schema_for(definition))?;
        count += 1;
    }
    Ok(count)
}

/// Register the full catalog, then every module's handlers.
///
/// # Errors
///
/// The first [`BusError`] raised by a catalog entry or a subscription.
pub fn register_all(ctx: &ModuleContext) -> Result<Vec<ModuleRegistration>, BusError> {
    let mut owned = Vec::with_capacity(ModuleId::INIT_ORDER.len());
    for module in ModuleId::INIT_ORDER {
        owned.push(register_events(ctx.bus(), module)?);
    }
    debug!(events = ctx.bus().catalog().len(), "Event catalog registered");

    let mut registrations = Vec::with_capacity(ModuleId::INIT_ORDER.len());
    for (module, events_owned) in ModuleId::INIT_ORDER.into_iter().zip(owned) {
        let subscriptions = registration_for(module)(ctx)?;
        info!(
            module = %module,
            events_owned,
            subscriptions = subscriptions.len(),
            "Module registered"
        );
        registrations.push(ModuleRegistration {
            module,
            events_owned,
            subscriptions,
        });
    }

    Ok(registrations)
}
