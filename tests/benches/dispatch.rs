//! # Dispatch Benchmarks
//!
//! Publish cost with trivial handlers, so the measurement is dominated by
//! validation, snapshot, and scheduling rather than handler bodies.
//!
//! | Case | Target |
//! |------|--------|
//! | validate + snapshot + N no-op sync handlers | p95 < 1ms |
//! | rejected publish (unknown event) | < 1ms |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use shared_bus::{BusConfig, Event, EventBus, EventSchema, Handler};
use std::time::Duration;

fn bus_with_subscribers(runtime: &tokio::runtime::Runtime, subscribers: usize) -> EventBus {
    let bus = EventBus::with_runtime(BusConfig::default().with_worker_pool_size(2), runtime.handle())
        .expect("bus");
    bus.register_event(
        EventSchema::new("quality.computed")
            .required(["resource_id", "quality_score"])
            .optional(["dimensions", "computed_by"]),
    )
    .expect("schema");
    for index in 0..subscribers {
        bus.subscribe(
            "quality.computed",
            Handler::sync(format!("bench::noop_{index}"), |_| Ok(())),
        )
        .expect("subscribe");
    }
    bus
}

fn quality_computed() -> Event {
    Event::from_json(
        "quality.computed",
        json!({"resource_id": "r-1", "quality_score": 0.87, "computed_by": "bench"}),
    )
    .expect("payload")
}

fn bench_sync_dispatch(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("dispatch-sync");
    group.measurement_time(Duration::from_secs(5));

    for subscribers in [0, 1, 8, 32] {
        let bus = bus_with_subscribers(&runtime, subscribers);
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(
            BenchmarkId::new("publish", subscribers),
            &subscribers,
            |b, _| b.iter(|| black_box(bus.publish(quality_computed()).expect("publish"))),
        );

        let snapshot = bus.metrics().snapshot();
        println!(
            "subscribers={subscribers} dispatch_p95_us={:?}",
            snapshot.dispatch_p95_us
        );
    }

    group.finish();
}

fn bench_rejected_publish(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let bus = bus_with_subscribers(&runtime, 4);
    let mut group = c.benchmark_group("dispatch-rejected");

    group.bench_function("unknown_event", |b| {
        b.iter(|| {
            let event = Event::from_json("quality.unknown", json!({"resource_id": "r-1"}))
                .expect("payload");
            black_box(bus.publish(event).is_err())
        })
    });
    group.bench_function("schema_violation", |b| {
        b.iter(|| {
            let event = Event::from_json("quality.computed", json!({"resource_id": "r-1"}))
                .expect("payload");
            black_box(bus.publish(event).is_err())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_sync_dispatch, bench_rejected_publish);
criterion_main!(benches);
