//! Resources: owns the resource lifecycle events and tracks ingestion status.

use shared_bus::{BusError, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::ModuleContext;

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    Ok(vec![ctx.observe(
        ModuleId::Resources,
        "track_ingestion_status",
        names::INGESTION_COMPLETED,
    )?])
}
