//! Ingestion: fetches content for new resources off the request path.

use serde_json::json;
use shared_bus::{BusError, Event, Handler, Payload, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::{handler_identity, publish_follow_up, ModuleContext};

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    let activity = ctx.activity();
    let publisher = ctx.publisher();

    let id = ctx.bus().subscribe(
        names::RESOURCE_CREATED,
        Handler::asynchronous(
            handler_identity(ModuleId::Ingestion, "ingest_resource"),
            move |event| {
                let activity = activity.clone();
                let publisher = publisher.clone();
                async move {
                    activity.record(ModuleId::Ingestion, &event);

                    let mut payload = Payload::new();
                    payload.insert("resource_id".into(), json!(event.str_field("resource_id")));
                    payload.insert("status".into(), json!("completed"));
                    publish_follow_up(
                        &publisher,
                        Event::caused_by(names::INGESTION_COMPLETED, payload, &event),
                    )
                }
            },
        ),
    )?;

    Ok(vec![id])
}
