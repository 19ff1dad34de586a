//! Collections: keeps membership consistent with the resource lifecycle.

use shared_bus::{BusError, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::ModuleContext;

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    Ok(vec![
        ctx.observe(ModuleId::Collections, "remove_deleted_resource", names::RESOURCE_DELETED)?,
        ctx.observe(ModuleId::Collections, "refresh_collection_embedding", names::RESOURCE_UPDATED)?,
    ])
}
