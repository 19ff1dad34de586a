//! Taxonomy: classifies new resources in the background.

use shared_bus::{BusError, Handler, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::{handler_identity, ModuleContext};

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    let activity = ctx.activity();
    let id = ctx.bus().subscribe(
        names::RESOURCE_CREATED,
        Handler::asynchronous(
            handler_identity(ModuleId::Taxonomy, "classify_resource"),
            move |event| {
                let activity = activity.clone();
                async move {
                    activity.record(ModuleId::Taxonomy, &event);
                    anyhow::Ok(())
                }
            },
        ),
    )?;
    Ok(vec![id])
}
