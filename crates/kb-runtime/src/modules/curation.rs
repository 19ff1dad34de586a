//! Curation: queues low-quality and outlier resources for review.

use shared_bus::{BusError, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::ModuleContext;

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    Ok(vec![
        ctx.observe(ModuleId::Curation, "enqueue_outlier", names::QUALITY_OUTLIER_DETECTED)?,
        ctx.observe(ModuleId::Curation, "track_quality", names::QUALITY_COMPUTED)?,
    ])
}
