//! Authority: normalises subjects found in metadata and classifications.

use shared_bus::{BusError, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::ModuleContext;

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    Ok(vec![
        ctx.observe(ModuleId::Authority, "normalize_subjects", names::METADATA_EXTRACTED)?,
        ctx.observe(ModuleId::Authority, "link_subjects", names::RESOURCE_CLASSIFIED)?,
    ])
}
