//! Search: keeps the index in step with resources and annotations.
//!
//! Indexing is synchronous so a resource is searchable by the time the
//! request that created it returns.

use serde_json::json;
use shared_bus::{BusError, Event, Handler, Payload, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::{handler_identity, publish_follow_up, ModuleContext};

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    let mut ids = Vec::new();

    for event_name in [names::RESOURCE_CREATED, names::RESOURCE_UPDATED] {
        let activity = ctx.activity();
        let publisher = ctx.publisher();
        ids.push(ctx.bus().subscribe(
            event_name,
            Handler::sync(
                handler_identity(ModuleId::Search, "index_resource"),
                move |event| {
                    activity.record(ModuleId::Search, event);

                    let mut payload = Payload::new();
                    payload.insert("resource_id".into(), json!(event.str_field("resource_id")));
                    publish_follow_up(
                        &publisher,
                        Event::caused_by(names::SEARCH_INDEX_UPDATED, payload, event),
                    )
                },
            ),
        )?);
    }

    ids.push(ctx.observe(ModuleId::Search, "remove_from_index", names::RESOURCE_DELETED)?);
    ids.push(ctx.observe(ModuleId::Search, "index_annotation", names::ANNOTATION_CREATED)?);
    Ok(ids)
}
