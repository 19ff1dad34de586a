//! Recommendations: learns user preferences from interactions.

use shared_bus::{BusError, SubscriptionId};
use shared_types::events::names;
use shared_types::ModuleId;

use super::ModuleContext;

pub fn subscribe(ctx: &ModuleContext) -> Result<Vec<SubscriptionId>, BusError> {
    [
        (names::USER_INTERACTION, "update_user_profile"),
        (names::ANNOTATION_CREATED, "learn_from_annotation"),
        (names::COLLECTION_RESOURCE_ADDED, "learn_from_collection"),
        (names::SEARCH_EXECUTED, "record_search"),
    ]
    .into_iter()
    .map(|(event_name, action)| ctx.observe(ModuleId::Recommendations, action, event_name))
    .collect()
}
