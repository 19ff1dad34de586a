//! Annotations: cascades resource deletion to its annotations.

use shared_bus::{BusError, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::ModuleContext;

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    Ok(vec![ctx.observe(
        ModuleId::Annotations,
        "cascade_delete",
        names::RESOURCE_DELETED,
    )?])
}
