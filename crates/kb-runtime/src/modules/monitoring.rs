//! Monitoring: counts every catalog event for operational dashboards.
//!
//! Registered last, so it sees the complete catalog.

use shared_bus::{BusError, SubscriptionId};
use shared_types::ModuleId;

use super::ModuleContext;

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    ctx.bus()
        .catalog()
        .names()
        .iter()
        .map(|event_name| ctx.observe(ModuleId::Monitoring, "count_events", event_name))
        .collect()
}
