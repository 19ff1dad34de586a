//! # Event Bus
//!
//! The publish entry point. `publish` validates against the catalog, takes a
//! snapshot of the registry for the event name, and hands both to the
//! delivery engine. It returns as soon as the synchronous batch is done.
//!
//! The bus is one explicitly constructed value, cloned into every module at
//! startup. Clones share the same catalog, registry, worker pool and metrics.

use std::sync::{Arc, Weak};
use std::time::Instant;

use futures::future::join_all;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::catalog::{EventCatalog, EventSchema};
use crate::config::BusConfig;
use crate::delivery::{DeliveryEngine, PendingDelivery, WorkerPool};
use crate::error::BusError;
use crate::event::Event;
use crate::handler::Handler;
use crate::isolation::HandlerResult;
use crate::metrics::BusMetrics;
use crate::registry::{HandlerRegistry, SubscriptionId};

struct BusInner {
    config: BusConfig,
    catalog: EventCatalog,
    registry: HandlerRegistry,
    engine: DeliveryEngine,
    metrics: Arc<BusMetrics>,
}

/// In-process publish/subscribe dispatcher.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Create a bus whose worker pool runs on the current Tokio runtime.
    ///
    /// # Errors
    ///
    /// [`BusError::NoRuntime`] outside a runtime, [`BusError::InvalidConfig`]
    /// for a zero-sized pool, queue or deadline.
    pub fn new(config: BusConfig) -> Result<Self, BusError> {
        let runtime = Handle::try_current().map_err(|_| BusError::NoRuntime)?;
        Self::with_runtime(config, &runtime)
    }

    /// Create a bus whose worker pool runs on `runtime`.
    ///
    /// # Errors
    ///
    /// [`BusError::InvalidConfig`] if `config` does not validate.
    pub fn with_runtime(config: BusConfig, runtime: &Handle) -> Result<Self, BusError> {
        config.validate()?;

        let metrics = Arc::new(BusMetrics::new());
        let pool = WorkerPool::spawn(
            runtime,
            config.worker_pool_size,
            config.queue_depth,
            Arc::clone(&metrics),
        );
        let engine = DeliveryEngine::new(pool, Arc::clone(&metrics), config.handler_timeout);

        info!(
            workers = config.worker_pool_size,
            queue_depth = config.queue_depth,
            handler_timeout_ms = config.handler_timeout.as_millis() as u64,
            "Event bus created"
        );

        Ok(Self {
            inner: Arc::new(BusInner {
                config,
                catalog: EventCatalog::new(),
                registry: HandlerRegistry::new(),
                engine,
                metrics,
            }),
        })
    }

    /// Add an event schema to the catalog.
    ///
    /// # Errors
    ///
    /// [`BusError::DuplicateEvent`] if the name is taken by a different schema.
    pub fn register_event(&self, schema: EventSchema) -> Result<(), BusError> {
        self.inner.catalog.register(schema)
    }

    /// Subscribe `handler` to `event_name`.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownEvent`] if the event is not in the catalog.
    pub fn subscribe(&self, event_name: &str, handler: Handler) -> Result<SubscriptionId, BusError> {
        if !self.inner.catalog.contains(event_name) {
            return Err(BusError::UnknownEvent {
                name: event_name.to_string(),
            });
        }
        Ok(self.inner.registry.subscribe(event_name, handler))
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.registry.unsubscribe(id)
    }

    /// Publish an event.
    ///
    /// Sync subscribers have all run when this returns. Async subscribers
    /// may still be in flight; see [`PublishResult::wait_async`].
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownEvent`] or [`BusError::SchemaViolation`]. No
    /// handler runs in either case.
    pub fn publish(&self, event: Event) -> Result<PublishResult, BusError> {
        let started = Instant::now();
        let inner = &self.inner;

        if let Err(err) = inner.catalog.validate(event.name(), event.payload()) {
            inner.metrics.record_rejected();
            warn!(
                event = %event.name(),
                correlation_id = %event.correlation_id(),
                error = %err,
                "Publish rejected"
            );
            return Err(err);
        }
        inner.metrics.record_published();

        let snapshot = inner.registry.snapshot(event.name());
        let event = Arc::new(event);
        let delivery = inner.engine.deliver(&event, &snapshot);

        let overhead = started.elapsed().saturating_sub(delivery.handler_time);
        inner.metrics.record_dispatch(overhead);

        debug!(
            event = %event.name(),
            correlation_id = %event.correlation_id(),
            subscribers = snapshot.len(),
            pending_async = delivery.pending.len(),
            overhead_us = overhead.as_micros() as u64,
            "Event published"
        );

        Ok(PublishResult {
            accepted: true,
            handler_results: delivery.completed,
            event,
            pending: delivery.pending,
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &EventCatalog {
        &self.inner.catalog
    }

    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn metrics(&self) -> &BusMetrics {
        &self.inner.metrics
    }

    #[must_use]
    pub fn config(&self) -> &BusConfig {
        &self.inner.config
    }

    /// Async deliveries accepted but not finished.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.inner.engine.pool().in_flight().current()
    }

    /// Resolve once no async delivery is in flight.
    pub async fn wait_idle(&self) {
        self.inner.engine.pool().in_flight().wait_idle().await;
    }

    /// Close the worker queue and wait for queued deliveries to drain.
    ///
    /// Async deliveries submitted afterwards fail with `PoolClosed`; sync
    /// delivery keeps working.
    pub async fn shutdown(&self) {
        info!(in_flight = self.in_flight(), "Event bus shutting down");
        self.inner.engine.pool().shutdown().await;
    }

    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.inner.engine.pool().is_closed()
    }

    #[must_use]
    pub fn worker_pool_size(&self) -> usize {
        self.inner.engine.pool().size()
    }

    /// A handle that does not keep the bus alive.
    ///
    /// Handlers that publish follow-up events capture this instead of a
    /// clone, so the registry does not own the bus it lives in.
    #[must_use]
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("config", &self.inner.config)
            .field("events", &self.inner.catalog.len())
            .field("subscriptions", &self.inner.registry.len())
            .finish()
    }
}

/// Non-owning [`EventBus`] handle.
#[derive(Clone, Debug, Default)]
pub struct WeakEventBus {
    inner: Weak<BusInner>,
}

impl WeakEventBus {
    /// `None` once every strong handle is gone.
    #[must_use]
    pub fn upgrade(&self) -> Option<EventBus> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

impl std::fmt::Debug for BusInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusInner").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Outcome of one accepted publish.
#[derive(Debug)]
pub struct PublishResult {
    /// Always `true`: rejected publishes return `Err` instead.
    pub accepted: bool,
    /// Sync results in registration order, then async submissions rejected at enqueue.
    pub handler_results: Vec<HandlerResult>,
    event: Arc<Event>,
    pending: Vec<PendingDelivery>,
}

impl PublishResult {
    /// The event as delivered to handlers.
    #[must_use]
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Async deliveries still owed a result.
    #[must_use]
    pub fn pending_async(&self) -> usize {
        self.pending.len()
    }

    /// Number of results this publish will produce in total.
    #[must_use]
    pub fn expected_results(&self) -> usize {
        self.handler_results.len() + self.pending.len()
    }

    /// Await the async deliveries and return every result of this publish.
    pub async fn wait_async(self) -> Vec<HandlerResult> {
        let mut results = self.handler_results;
        results.extend(join_all(self.pending.into_iter().map(PendingDelivery::wait)).await);
        results
    }
}
