//! Scholarly: extracts metadata once content is available.

use shared_bus::{BusError, Handler, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::{handler_identity, ModuleContext};

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    let activity = ctx.activity();
    let id = ctx.bus().subscribe(
        names::INGESTION_COMPLETED,
        Handler::asynchronous(
            handler_identity(ModuleId::Scholarly, "extract_metadata"),
            move |event| {
                let activity = activity.clone();
                async move {
                    activity.record(ModuleId::Scholarly, &event);
                    anyhow::Ok(())
                }
            },
        ),
    )?;
    Ok(vec![id])
}
