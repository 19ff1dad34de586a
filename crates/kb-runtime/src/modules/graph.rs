//! Graph: turns extracted citations into edges and drops edges of deleted resources.

use serde_json::{json, Value};
use shared_bus::{BusError, Event, Handler, Payload, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::{handler_identity, publish_follow_up, ModuleContext};

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    let activity = ctx.activity();
    let publisher = ctx.publisher();

    let link = ctx.bus().subscribe(
        names::CITATION_EXTRACTED,
        Handler::asynchronous(
            handler_identity(ModuleId::Graph, "link_citations"),
            move |event| {
                let activity = activity.clone();
                let publisher = publisher.clone();
                async move {
                    activity.record(ModuleId::Graph, &event);

                    let edge_count = event
                        .field("citations")
                        .and_then(Value::as_array)
                        .map_or(0, Vec::len);

                    let mut payload = Payload::new();
                    payload.insert("resource_id".into(), json!(event.str_field("resource_id")));
                    payload.insert("edge_count".into(), json!(edge_count));
                    publish_follow_up(
                        &publisher,
                        Event::caused_by(names::GRAPH_UPDATED, payload, &event),
                    )
                }
            },
        ),
    )?;

    let drop_edges = ctx.observe(ModuleId::Graph, "drop_resource_edges", names::RESOURCE_DELETED)?;

    Ok(vec![link, drop_edges])
}
