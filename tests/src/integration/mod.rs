//! Integration scenarios, one file per area.

pub mod choreography;
pub mod delivery;
pub mod dispatch;
pub mod isolation_check;

#[cfg(test)]
pub(crate) mod support {
    use kb_runtime::wiring::schema_for;
    use serde_json::Value;
    use shared_bus::{BusConfig, Event, EventBus};
    use shared_types::DOMAIN_EVENTS;

    /// A bus whose catalog holds every domain event and nothing is subscribed.
    pub fn catalog_bus(config: BusConfig) -> EventBus {
        let bus = EventBus::new(config).unwrap();
        for definition in DOMAIN_EVENTS {
            bus.register_event(schema_for(definition)).unwrap();
        }
        bus
    }

    pub fn event(name: &str, payload: Value) -> Event {
        Event::from_json(name, payload).unwrap()
    }
}
