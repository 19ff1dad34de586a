//! Quality: scores new and changed resources in the background.

use shared_bus::{BusError, Handler, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::{handler_identity, ModuleContext};

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    let mut ids = Vec::new();

    for (event_name, action) in [
        (names::RESOURCE_CREATED, "score_new_resource"),
        (names::RESOURCE_CONTENT_CHANGED, "rescore_resource"),
    ] {
        let activity = ctx.activity();
        ids.push(ctx.bus().subscribe(
            event_name,
            Handler::asynchronous(handler_identity(ModuleId::Quality, action), move |event| {
                let activity = activity.clone();
                async move {
                    activity.record(ModuleId::Quality, &event);
                    anyhow::Ok(())
                }
            }),
        )?);
    }

    Ok(ids)
}
