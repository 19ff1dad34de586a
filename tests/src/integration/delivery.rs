//! # Delivery Scenarios
//!
//! The async path through the worker pool: per-handler deadlines,
//! at-most-once attempts, queue backpressure, chained publishes and
//! shutdown.

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use serde_json::json;
    use shared_bus::{BusConfig, Event, Handler, HandlerError};
    use shared_types::events::names;
    use tokio::time::timeout;

    use crate::integration::support::{catalog_bus, event};

    fn resource_created(id: &str) -> Event {
        event(
            names::RESOURCE_CREATED,
            json!({"resource_id": id, "title": "On the Electrodynamics of Moving Bodies"}),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_async_deadline_overrun_is_a_timeout() {
        let bus = catalog_bus(BusConfig::default().with_worker_pool_size(2));
        bus.subscribe(
            names::RESOURCE_CREATED,
            Handler::asynchronous("quality::slow_scorer", |_| async {
                tokio::time::sleep(Duration::from_millis(200)).await;
                anyhow::Ok(())
            })
            .with_timeout(Duration::from_millis(50)),
        )
        .unwrap();
        let sync_calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sync_calls);
        bus.subscribe(
            names::RESOURCE_CREATED,
            Handler::sync("search::index_resource", move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        let started = Instant::now();
        let result = bus.publish(resource_created("r-1")).unwrap();
        let sync_batch = started.elapsed();

        // The sync batch does not wait on the slow async handler.
        assert!(sync_batch < Duration::from_millis(100), "{sync_batch:?}");
        assert_eq!(sync_calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.handler_results.len(), 1);
        assert_eq!(result.pending_async(), 1);

        let results = timeout(Duration::from_secs(2), result.wait_async())
            .await
            .unwrap();
        let slow = results
            .iter()
            .find(|r| r.handler() == "quality::slow_scorer")
            .unwrap();
        assert_eq!(
            slow.error(),
            Some(&HandlerError::Timeout {
                deadline: Duration::from_millis(50)
            })
        );
        assert!(slow.duration < Duration::from_millis(200));
        assert_eq!(bus.metrics().snapshot().handler_timeouts, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_every_async_handler_is_attempted_once() {
        let bus = catalog_bus(BusConfig::default().with_worker_pool_size(3));
        let calls: Vec<Arc<AtomicUsize>> = (0..4).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        for (index, counter) in calls.iter().enumerate() {
            let counter = Arc::clone(counter);
            bus.subscribe(
                names::RESOURCE_CREATED,
                Handler::asynchronous(format!("taxonomy::classifier_{index}"), move |_| {
                    let counter = Arc::clone(&counter);
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        anyhow::Ok(())
                    }
                }),
            )
            .unwrap();
        }

        let result = bus.publish(resource_created("r-2")).unwrap();
        assert_eq!(result.expected_results(), 4);
        let results = timeout(Duration::from_secs(2), result.wait_async())
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.is_success()));
        assert!(calls.iter().all(|c| c.load(Ordering::SeqCst) == 1));
        assert_eq!(bus.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_is_settled_once_results_arrive() {
        let bus = catalog_bus(BusConfig::default().with_worker_pool_size(4));
        bus.subscribe(
            names::RESOURCE_CREATED,
            Handler::asynchronous("graph::link_resource", |_| async { anyhow::Ok(()) }),
        )
        .unwrap();

        for round in 0..2_000 {
            let result = bus.publish(resource_created(&format!("r-{round}"))).unwrap();
            let results = timeout(Duration::from_secs(2), result.wait_async())
                .await
                .unwrap();
            assert_eq!(results.len(), 1);
            assert_eq!(bus.in_flight(), 0, "job still counted after round {round}");
        }
    }

    #[tokio::test]
    async fn test_full_queue_rejects_without_blocking() {
        // Current-thread runtime: the single worker cannot drain the queue
        // until this test yields, so the second and third submissions find
        // it full.
        let bus = catalog_bus(
            BusConfig::default()
                .with_worker_pool_size(1)
                .with_queue_depth(1),
        );
        for index in 0..3 {
            bus.subscribe(
                names::RESOURCE_CREATED,
                Handler::asynchronous(format!("scholarly::extract_{index}"), |_| async {
                    anyhow::Ok(())
                }),
            )
            .unwrap();
        }

        let result = bus.publish(resource_created("r-3")).unwrap();

        assert!(result.accepted);
        assert_eq!(result.pending_async(), 1);
        assert_eq!(result.handler_results.len(), 2);
        assert!(result
            .handler_results
            .iter()
            .all(|r| r.error() == Some(&HandlerError::QueueFull)));
        assert_eq!(bus.metrics().snapshot().queue_rejections, 2);

        let results = timeout(Duration::from_secs(2), result.wait_async())
            .await
            .unwrap();
        assert_eq!(results.iter().filter(|r| r.is_success()).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_wait_idle_covers_chained_async_publishes() {
        let bus = catalog_bus(BusConfig::default().with_worker_pool_size(2));
        let weak = bus.downgrade();
        let completed = Arc::new(AtomicUsize::new(0));

        bus.subscribe(
            names::RESOURCE_CREATED,
            Handler::asynchronous("ingestion::ingest", move |event: Arc<Event>| {
                let weak = weak.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    if let Some(bus) = weak.upgrade() {
                        let resource_id = event.str_field("resource_id").unwrap_or_default();
                        let payload = json!({"resource_id": resource_id, "status": "completed"});
                        let serde_json::Value::Object(payload) = payload else {
                            anyhow::bail!("payload is not an object");
                        };
                        bus.publish(Event::caused_by(
                            names::INGESTION_COMPLETED,
                            payload,
                            &event,
                        ))?;
                    }
                    anyhow::Ok(())
                }
            }),
        )
        .unwrap();
        let counter = Arc::clone(&completed);
        bus.subscribe(
            names::INGESTION_COMPLETED,
            Handler::asynchronous("scholarly::extract_metadata", move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }),
        )
        .unwrap();

        drop(bus.publish(resource_created("r-4")).unwrap());
        timeout(Duration::from_secs(2), bus.wait_idle()).await.unwrap();

        assert_eq!(completed.load(Ordering::SeqCst), 1);
        assert_eq!(bus.metrics().snapshot().events_published, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_drains_queue_then_rejects() {
        let bus = catalog_bus(BusConfig::default().with_worker_pool_size(1));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        bus.subscribe(
            names::RESOURCE_CREATED,
            Handler::asynchronous("taxonomy::classify", move |_| {
                let counter = Arc::clone(&counter);
                async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }),
        )
        .unwrap();

        for n in 0..3 {
            drop(bus.publish(resource_created(&format!("r-{n}"))).unwrap());
        }
        timeout(Duration::from_secs(2), bus.shutdown()).await.unwrap();

        assert!(bus.is_shut_down());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(bus.in_flight(), 0);

        let result = bus.publish(resource_created("r-late")).unwrap();
        assert_eq!(result.pending_async(), 0);
        assert_eq!(
            result.handler_results[0].error(),
            Some(&HandlerError::PoolClosed)
        );
    }
}
