//! # Dispatch Scenarios
//!
//! Catalog validation at the publish boundary, snapshot isolation of the
//! subscriber list, registration-order delivery, and failure isolation
//! between synchronous subscribers.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use parking_lot::Mutex;
    use serde_json::json;
    use shared_bus::{BusConfig, BusError, Handler, HandlerError, SubscriptionId};
    use shared_types::events::names;

    use crate::integration::support::{catalog_bus, event};

    fn config() -> BusConfig {
        BusConfig::default().with_worker_pool_size(2)
    }

    fn quality_computed() -> shared_bus::Event {
        event(
            names::QUALITY_COMPUTED,
            json!({"resource_id": "r-1", "quality_score": 0.82}),
        )
    }

    // =========================================================================
    // FAILURE ISOLATION
    // =========================================================================

    #[tokio::test]
    async fn test_failing_middle_subscriber_is_isolated() {
        let bus = catalog_bus(config());
        let calls = Arc::new(AtomicUsize::new(0));

        let first = Arc::clone(&calls);
        bus.subscribe(
            names::QUALITY_COMPUTED,
            Handler::sync("curation::queue_review", move |_| {
                first.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();
        bus.subscribe(
            names::QUALITY_COMPUTED,
            Handler::sync("broken::always_fails", |_| {
                Err(anyhow::anyhow!("RuntimeError: scoring backend unavailable"))
            }),
        )
        .unwrap();
        let third = Arc::clone(&calls);
        bus.subscribe(
            names::QUALITY_COMPUTED,
            Handler::sync("monitoring::record", move |_| {
                third.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        let result = bus.publish(quality_computed()).unwrap();

        assert!(result.accepted);
        let outcomes: Vec<bool> = result.handler_results.iter().map(|r| r.is_success()).collect();
        assert_eq!(outcomes, vec![true, false, true]);
        assert_eq!(result.handler_results[1].handler(), "broken::always_fails");
        match result.handler_results[1].error() {
            Some(HandlerError::Failed { message, .. }) => {
                assert!(message.contains("scoring backend unavailable"));
            }
            other => panic!("expected a handler failure, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        let metrics = bus.metrics().snapshot();
        assert_eq!(metrics.deliveries_succeeded, 2);
        assert_eq!(metrics.deliveries_failed, 1);
    }

    #[tokio::test]
    async fn test_panicking_subscriber_is_isolated() {
        let bus = catalog_bus(config());
        bus.subscribe(
            names::QUALITY_COMPUTED,
            Handler::sync("broken::panics", |event| {
                panic!("unexpected score {:?}", event.field("quality_score"))
            }),
        )
        .unwrap();
        bus.subscribe(
            names::QUALITY_COMPUTED,
            Handler::sync("curation::queue_review", |_| Ok(())),
        )
        .unwrap();

        let result = bus.publish(quality_computed()).unwrap();

        assert!(matches!(
            result.handler_results[0].error(),
            Some(HandlerError::Panicked { message, detail })
                if message.contains("unexpected score") && detail.contains("dispatch.rs")
        ));
        assert!(result.handler_results[1].is_success());

        // The bus keeps working after a handler panic.
        let again = bus.publish(quality_computed()).unwrap();
        assert_eq!(again.handler_results.len(), 2);
    }

    // =========================================================================
    // CATALOG VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_unknown_event_reaches_no_handler() {
        let bus = catalog_bus(config());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        bus.subscribe(
            names::QUALITY_COMPUTED,
            Handler::sync("curation::queue_review", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        let err = bus
            .publish(event("quality.recomputed", json!({"resource_id": "r-1"})))
            .unwrap_err();

        assert_eq!(
            err,
            BusError::UnknownEvent {
                name: "quality.recomputed".to_string()
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.metrics().snapshot().events_rejected, 1);
        assert_eq!(bus.metrics().snapshot().events_published, 0);
    }

    #[tokio::test]
    async fn test_schema_violation_names_the_fields() {
        let bus = catalog_bus(config());
        bus.subscribe(
            names::QUALITY_COMPUTED,
            Handler::sync("curation::queue_review", |_| Ok(())),
        )
        .unwrap();

        let err = bus
            .publish(event(
                names::QUALITY_COMPUTED,
                json!({"resource_id": "r-1", "score": 0.4}),
            ))
            .unwrap_err();

        match err {
            BusError::SchemaViolation {
                name,
                missing,
                unexpected,
            } => {
                assert_eq!(name, names::QUALITY_COMPUTED);
                assert_eq!(missing, vec!["quality_score".to_string()]);
                assert_eq!(unexpected, vec!["score".to_string()]);
            }
            other => panic!("expected a schema violation, got {other:?}"),
        }
        assert_eq!(bus.metrics().snapshot().deliveries(), 0);
    }

    #[tokio::test]
    async fn test_optional_fields_are_accepted() {
        let bus = catalog_bus(config());
        let result = bus
            .publish(event(
                names::QUALITY_COMPUTED,
                json!({
                    "resource_id": "r-1",
                    "quality_score": 0.9,
                    "dimensions": {"accuracy": 0.95},
                    "computed_by": "quality::scorer"
                }),
            ))
            .unwrap();
        assert!(result.accepted);
        assert!(result.handler_results.is_empty());
    }

    // =========================================================================
    // SNAPSHOTS AND ORDERING
    // =========================================================================

    #[tokio::test]
    async fn test_subscribe_during_publish_waits_for_next_publish() {
        let bus = catalog_bus(config());
        let weak = bus.downgrade();
        let late_calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&late_calls);
        bus.subscribe(
            names::RESOURCE_DELETED,
            Handler::sync("collections::subscribe_late", move |_| {
                let Some(bus) = weak.upgrade() else {
                    return Ok(());
                };
                let counter = Arc::clone(&counter);
                bus.subscribe(
                    names::RESOURCE_DELETED,
                    Handler::sync("annotations::late", move |_| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }),
                )?;
                Ok(())
            }),
        )
        .unwrap();

        let deleted = || event(names::RESOURCE_DELETED, json!({"resource_id": "r-9"}));

        let first = bus.publish(deleted()).unwrap();
        assert_eq!(first.handler_results.len(), 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        // The handler added during the first publish is now in the snapshot;
        // the one added during this publish is not.
        let second = bus.publish(deleted()).unwrap();
        assert_eq!(second.handler_results.len(), 2);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsubscribe_during_publish_still_delivers_once() {
        let bus = catalog_bus(config());
        let weak = bus.downgrade();
        let target: Arc<Mutex<Option<SubscriptionId>>> = Arc::new(Mutex::new(None));
        let removed_calls = Arc::new(AtomicUsize::new(0));

        let slot = Arc::clone(&target);
        bus.subscribe(
            names::RESOURCE_DELETED,
            Handler::sync("search::drop_next", move |_| {
                if let (Some(bus), Some(id)) = (weak.upgrade(), slot.lock().take()) {
                    bus.unsubscribe(id);
                }
                Ok(())
            }),
        )
        .unwrap();
        let counter = Arc::clone(&removed_calls);
        let id = bus
            .subscribe(
                names::RESOURCE_DELETED,
                Handler::sync("graph::prune", move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        *target.lock() = Some(id);

        let deleted = || event(names::RESOURCE_DELETED, json!({"resource_id": "r-9"}));
        bus.publish(deleted()).unwrap();
        bus.publish(deleted()).unwrap();

        assert_eq!(removed_calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.registry().subscriber_count(names::RESOURCE_DELETED), 1);
    }

    #[tokio::test]
    async fn test_sync_order_is_stable_across_publishes() {
        let bus = catalog_bus(config());
        let seen = Arc::new(Mutex::new(Vec::new()));

        for index in 0..6 {
            let sink = Arc::clone(&seen);
            bus.subscribe(
                names::SEARCH_EXECUTED,
                Handler::sync(format!("recommendations::observer_{index}"), move |_| {
                    sink.lock().push(index);
                    Ok(())
                }),
            )
            .unwrap();
        }

        for run in 0..25 {
            seen.lock().clear();
            let result = bus
                .publish(event(
                    names::SEARCH_EXECUTED,
                    json!({"query": "graph neural networks", "result_count": run}),
                ))
                .unwrap();
            assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4, 5], "run {run}");

            let order: Vec<&str> = result.handler_results.iter().map(|r| r.handler()).collect();
            assert_eq!(order[0], "recommendations::observer_0");
            assert_eq!(order[5], "recommendations::observer_5");
        }
    }

    // =========================================================================
    // CONCURRENT PUBLISHERS
    // =========================================================================

    #[tokio::test]
    async fn test_concurrent_publishers_keep_exact_counts() {
        let bus = catalog_bus(config());
        let calls = Arc::new(AtomicUsize::new(0));
        for index in 0..3 {
            let counter = Arc::clone(&calls);
            bus.subscribe(
                names::USER_INTERACTION,
                Handler::sync(format!("recommendations::track_{index}"), move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
            .unwrap();
        }

        std::thread::scope(|scope| {
            for publisher in 0..8 {
                let bus = bus.clone();
                scope.spawn(move || {
                    for n in 0..100 {
                        bus.publish(event(
                            names::USER_INTERACTION,
                            json!({
                                "user_id": format!("u-{publisher}"),
                                "resource_id": format!("r-{n}"),
                                "interaction_type": "view"
                            }),
                        ))
                        .unwrap();
                    }
                });
            }
        });

        let metrics = bus.metrics().snapshot();
        assert_eq!(metrics.events_published, 800);
        assert_eq!(metrics.deliveries_succeeded, 2400);
        assert_eq!(calls.load(Ordering::SeqCst), 2400);
        assert!(metrics.dispatch_p95_us.is_some());
    }
}
