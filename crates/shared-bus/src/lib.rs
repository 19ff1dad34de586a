//! # Shared Bus - Event Bus for Inter-Module Communication
//!
//! Domain modules never import one another. They collaborate by publishing
//! named events and subscribing to the events other modules publish.
//!
//! ```text
//! ┌──────────────┐                         ┌──────────────┐
//! │  Module A    │                         │  Module B    │
//! │              │   publish(event)        │              │
//! │              │ ──────┐                 │              │
//! └──────────────┘       │                 └──────────────┘
//!                        ▼                         ↑
//!   ┌─────────────────────────────────────┐        │
//!   │ EventBus                            │        │
//!   │  catalog.validate ─► registry.snapshot ──────┤ sync: inline, in order
//!   │                     └► worker pool ──────────┘ async: bounded queue
//!   └─────────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - `publish` fails before any handler runs if the event is unknown or its
//!   payload does not fit the catalog schema.
//! - The handler set for a publish is the registry snapshot taken at that
//!   moment. Subscriptions added while handlers run are not invoked.
//! - A failing, panicking or overrunning handler produces a failed
//!   [`HandlerResult`]; siblings still run and the publisher never sees it.
//!
//! ## Example
//!
//! ```no_run
//! use shared_bus::{BusConfig, Event, EventBus, EventSchema, Handler};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), shared_bus::BusError> {
//! let bus = EventBus::new(BusConfig::default())?;
//! bus.register_event(EventSchema::new("resource.created").required(["resource_id", "title"]))?;
//! bus.subscribe("resource.created", Handler::sync("search::index", |_| Ok(())))?;
//!
//! let event = Event::from_json("resource.created", json!({"resource_id": "r-1", "title": "Rust"}))?;
//! let result = bus.publish(event)?;
//! assert!(result.accepted);
//! # Ok(())
//! # }
//! ```

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod catalog;
pub mod config;
mod delivery;
pub mod error;
pub mod event;
pub mod handler;
pub mod isolation;
pub mod metrics;
pub mod registry;

// Re-export main types
pub use bus::{EventBus, PublishResult, WeakEventBus};
pub use catalog::{EventCatalog, EventSchema};
pub use config::BusConfig;
pub use error::{BusError, HandlerError};
pub use event::{Event, Payload};
pub use handler::{AsyncHandler, DeliveryMode, Handler, SyncHandler};
pub use isolation::{HandlerResult, Outcome};
pub use metrics::{BusMetrics, LatencyHistogram, MetricsSnapshot};
pub use registry::{HandlerRegistry, Subscription, SubscriptionId, SubscriptionInfo};
