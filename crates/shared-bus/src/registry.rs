//! # Handler Registry
//!
//! Ordered subscriber lists keyed by event name.
//!
//! Each list is stored as an immutable `Arc<[Arc<Subscription>]>`. Writers
//! build a new list and swap it in under a short write lock; readers only
//! clone the `Arc`. A snapshot taken by `publish` is therefore unaffected by
//! any `subscribe`/`unsubscribe` that happens while its handlers run.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::handler::{DeliveryMode, Handler};

/// Handle returned by `subscribe`; also the global registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A handler bound to one event name.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    event_name: Arc<str>,
    handler: Handler,
}

impl Subscription {
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Monotonic across the whole registry.
    #[must_use]
    pub fn registration_order(&self) -> u64 {
        self.id.0
    }

    #[must_use]
    pub fn event_name(&self) -> &str {
        &self.event_name
    }

    #[must_use]
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        self.handler.mode()
    }

    /// Handler deadline, falling back to `default` when none was configured.
    #[must_use]
    pub fn deadline(&self, default: Duration) -> Duration {
        self.handler.timeout().unwrap_or(default)
    }

    /// Lightweight descriptor attached to every [`HandlerResult`](crate::HandlerResult).
    #[must_use]
    pub fn info(&self) -> SubscriptionInfo {
        SubscriptionInfo {
            id: self.id,
            event_name: Arc::clone(&self.event_name),
            handler: self.handler.identity_arc(),
            mode: self.handler.mode(),
        }
    }
}

/// Identifies the subscription a result belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionInfo {
    pub id: SubscriptionId,
    pub event_name: Arc<str>,
    pub handler: Arc<str>,
    pub mode: DeliveryMode,
}

/// Immutable view of one event's subscribers, in registration order.
pub type Snapshot = Arc<[Arc<Subscription>]>;

/// Stores, per event name, the ordered list of subscriptions.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    by_event: RwLock<HashMap<String, Snapshot>>,
    next_id: AtomicU64,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler to the list for `event_name`.
    pub fn subscribe(&self, event_name: &str, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let identity = handler.identity().to_string();
        let mode = handler.mode();
        let subscription = Arc::new(Subscription {
            id,
            event_name: Arc::from(event_name),
            handler,
        });

        let mut by_event = self.by_event.write();
        let current = by_event.get(event_name).cloned();
        let mut next: Vec<Arc<Subscription>> = current.map(|list| list.to_vec()).unwrap_or_default();
        next.push(subscription);
        by_event.insert(event_name.to_string(), Arc::from(next));
        drop(by_event);

        debug!(event = %event_name, handler = %identity, %mode, %id, "Handler subscribed");
        id
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut by_event = self.by_event.write();

        let Some(event_name) = by_event
            .iter()
            .find(|(_, list)| list.iter().any(|sub| sub.id == id))
            .map(|(name, _)| name.clone())
        else {
            return false;
        };

        let remaining: Vec<Arc<Subscription>> = by_event
            .get(&event_name)
            .map(|list| list.iter().filter(|sub| sub.id != id).cloned().collect())
            .unwrap_or_default();

        if remaining.is_empty() {
            by_event.remove(&event_name);
        } else {
            by_event.insert(event_name.clone(), Arc::from(remaining));
        }
        drop(by_event);

        debug!(event = %event_name, %id, "Handler unsubscribed");
        true
    }

    /// The current subscriber list for `event_name`.
    ///
    /// Later registrations never show up in a snapshot already taken.
    #[must_use]
    pub fn snapshot(&self, event_name: &str) -> Snapshot {
        self.by_event
            .read()
            .get(event_name)
            .cloned()
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    #[must_use]
    pub fn subscriber_count(&self, event_name: &str) -> usize {
        self.by_event.read().get(event_name).map_or(0, |list| list.len())
    }

    /// Total subscriptions across all events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_event.read().values().map(|list| list.len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
