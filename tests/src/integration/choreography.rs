//! # Module Choreography
//!
//! The full runtime with every domain module registered. External
//! collaborators publish events; modules react only through the bus.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use kb_runtime::{KnowledgeRuntime, RuntimeConfig};
    use serde_json::json;
    use shared_bus::{BusConfig, Handler};
    use shared_types::events::names;
    use shared_types::ModuleId;
    use tokio::time::timeout;

    use crate::integration::support::event;

    fn runtime() -> KnowledgeRuntime {
        KnowledgeRuntime::new(RuntimeConfig {
            bus: BusConfig::default().with_worker_pool_size(2),
            shutdown_grace: Duration::from_secs(1),
            ..RuntimeConfig::default()
        })
        .unwrap()
    }

    async fn settle(runtime: &KnowledgeRuntime) {
        timeout(Duration::from_secs(2), runtime.bus().wait_idle())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_quality_computed_survives_a_broken_subscriber() {
        let runtime = runtime();
        runtime
            .bus()
            .subscribe(
                names::QUALITY_COMPUTED,
                Handler::sync("reporting::export", |_| {
                    Err(anyhow::anyhow!("export target unreachable"))
                }),
            )
            .unwrap();

        let result = runtime
            .bus()
            .publish(event(
                names::QUALITY_COMPUTED,
                json!({"resource_id": "r-1", "quality_score": 0.31}),
            ))
            .unwrap();
        assert!(result.accepted);
        assert_eq!(
            result.handler_results.iter().filter(|r| !r.is_success()).count(),
            1
        );
        settle(&runtime).await;

        let activity = runtime.activity();
        assert_eq!(activity.count(ModuleId::Curation, names::QUALITY_COMPUTED), 1);
        assert_eq!(activity.count(ModuleId::Monitoring, names::QUALITY_COMPUTED), 1);
    }

    #[tokio::test]
    async fn test_resource_deleted_reaches_every_dependent_module() {
        let runtime = runtime();

        runtime
            .bus()
            .publish(event(
                names::RESOURCE_DELETED,
                json!({"resource_id": "r-2", "deleted_by": "u-1"}),
            ))
            .unwrap();
        settle(&runtime).await;

        let activity = runtime.activity();
        for module in [
            ModuleId::Collections,
            ModuleId::Annotations,
            ModuleId::Search,
            ModuleId::Graph,
            ModuleId::Monitoring,
        ] {
            assert_eq!(
                activity.count(module, names::RESOURCE_DELETED),
                1,
                "{module} should observe resource.deleted"
            );
        }
        assert_eq!(activity.total_for(ModuleId::Quality), 0);
    }

    #[tokio::test]
    async fn test_interactions_feed_recommendations() {
        let runtime = runtime();

        for kind in ["view", "bookmark", "share"] {
            runtime
                .bus()
                .publish(event(
                    names::USER_INTERACTION,
                    json!({"user_id": "u-7", "resource_id": "r-3", "interaction_type": kind}),
                ))
                .unwrap();
        }
        runtime
            .bus()
            .publish(event(
                names::SEARCH_EXECUTED,
                json!({"query": "citation graphs", "result_count": 12}),
            ))
            .unwrap();

        let activity = runtime.activity();
        assert_eq!(activity.count(ModuleId::Recommendations, names::USER_INTERACTION), 3);
        assert_eq!(activity.count(ModuleId::Recommendations, names::SEARCH_EXECUTED), 1);
        assert_eq!(activity.total_for(ModuleId::Recommendations), 4);
    }

    #[tokio::test]
    async fn test_unknown_event_is_rejected_by_the_runtime_bus() {
        let runtime = runtime();
        let err = runtime
            .bus()
            .publish(event("resource.archived", json!({"resource_id": "r-4"})))
            .unwrap_err();

        assert!(err.to_string().contains("resource.archived"));
        assert!(runtime.activity().snapshot().is_empty());
    }
}
