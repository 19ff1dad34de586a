//! # Domain Event Catalog
//!
//! Declarative list of every domain event: its name, the module that owns
//! (publishes) it, and the payload fields it carries. Modules register the
//! entries they own at startup and subscribe by name to the rest.

use crate::module::ModuleId;

/// Event name constants. Subscribers use these instead of string literals.
pub mod names {
    pub const RESOURCE_CREATED: &str = "resource.created";
    pub const RESOURCE_UPDATED: &str = "resource.updated";
    pub const RESOURCE_DELETED: &str = "resource.deleted";
    pub const RESOURCE_CONTENT_CHANGED: &str = "resource.content_changed";
    pub const INGESTION_COMPLETED: &str = "ingestion.completed";
    pub const COLLECTION_CREATED: &str = "collection.created";
    pub const COLLECTION_RESOURCE_ADDED: &str = "collection.resource_added";
    pub const ANNOTATION_CREATED: &str = "annotation.created";
    pub const ANNOTATION_DELETED: &str = "annotation.deleted";
    pub const SEARCH_EXECUTED: &str = "search.executed";
    pub const SEARCH_INDEX_UPDATED: &str = "search.index_updated";
    pub const QUALITY_COMPUTED: &str = "quality.computed";
    pub const QUALITY_OUTLIER_DETECTED: &str = "quality.outlier_detected";
    pub const RESOURCE_CLASSIFIED: &str = "resource.classified";
    pub const TAXONOMY_NODE_CREATED: &str = "taxonomy.node_created";
    pub const GRAPH_UPDATED: &str = "graph.updated";
    pub const CITATION_EXTRACTED: &str = "citation.extracted";
    pub const METADATA_EXTRACTED: &str = "metadata.extracted";
    pub const USER_INTERACTION: &str = "user.interaction";
    pub const RECOMMENDATION_GENERATED: &str = "recommendation.generated";
    pub const CURATION_REVIEWED: &str = "curation.reviewed";
    pub const AUTHORITY_SUBJECT_ADDED: &str = "authority.subject_added";
}

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDefinition {
    pub name: &'static str,
    pub owner: ModuleId,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
}

const fn def(
    name: &'static str,
    owner: ModuleId,
    required: &'static [&'static str],
    optional: &'static [&'static str],
) -> EventDefinition {
    EventDefinition {
        name,
        owner,
        required,
        optional,
    }
}

/// Every domain event, grouped by owner.
pub const DOMAIN_EVENTS: &[EventDefinition] = &[
    // resources
    def(names::RESOURCE_CREATED, ModuleId::Resources, &["resource_id", "title"], &["source_url", "content_type", "created_by"]),
    def(names::RESOURCE_UPDATED, ModuleId::Resources, &["resource_id", "changed_fields"], &["updated_by"]),
    def(names::RESOURCE_DELETED, ModuleId::Resources, &["resource_id"], &["deleted_by"]),
    def(names::RESOURCE_CONTENT_CHANGED, ModuleId::Resources, &["resource_id"], &["content_hash"]),
    // ingestion
    def(names::INGESTION_COMPLETED, ModuleId::Ingestion, &["resource_id", "status"], &["duration_ms", "error"]),
    // collections
    def(names::COLLECTION_CREATED, ModuleId::Collections, &["collection_id", "name"], &["owner_id"]),
    def(names::COLLECTION_RESOURCE_ADDED, ModuleId::Collections, &["collection_id", "resource_id"], &[]),
    // annotations
    def(names::ANNOTATION_CREATED, ModuleId::Annotations, &["annotation_id", "resource_id"], &["user_id", "highlight"]),
    def(names::ANNOTATION_DELETED, ModuleId::Annotations, &["annotation_id", "resource_id"], &[]),
    // search
    def(names::SEARCH_EXECUTED, ModuleId::Search, &["query", "result_count"], &["user_id", "latency_ms"]),
    def(names::SEARCH_INDEX_UPDATED, ModuleId::Search, &["resource_id"], &[]),
    // quality
    def(names::QUALITY_COMPUTED, ModuleId::Quality, &["resource_id", "quality_score"], &["dimensions", "computed_by"]),
    def(names::QUALITY_OUTLIER_DETECTED, ModuleId::Quality, &["resource_id", "outlier_score"], &["reasons"]),
    // taxonomy
    def(names::RESOURCE_CLASSIFIED, ModuleId::Taxonomy, &["resource_id", "category_ids"], &["confidence"]),
    def(names::TAXONOMY_NODE_CREATED, ModuleId::Taxonomy, &["node_id", "name"], &["parent_id"]),
    // graph
    def(names::GRAPH_UPDATED, ModuleId::Graph, &["resource_id"], &["edge_count"]),
    // scholarly
    def(names::CITATION_EXTRACTED, ModuleId::Scholarly, &["resource_id", "citations"], &["extraction_method"]),
    def(names::METADATA_EXTRACTED, ModuleId::Scholarly, &["resource_id"], &["authors", "doi", "publication_year"]),
    // recommendations
    def(names::USER_INTERACTION, ModuleId::Recommendations, &["user_id", "resource_id", "interaction_type"], &["dwell_time_ms"]),
    def(names::RECOMMENDATION_GENERATED, ModuleId::Recommendations, &["user_id", "resource_ids"], &["strategy"]),
    // curation
    def(names::CURATION_REVIEWED, ModuleId::Curation, &["resource_id", "reviewer_id", "decision"], &["notes"]),
    // authority
    def(names::AUTHORITY_SUBJECT_ADDED, ModuleId::Authority, &["subject", "canonical_form"], &["variants"]),
];

/// Look up a definition by event name.
#[must_use]
pub fn definition(name: &str) -> Option<&'static EventDefinition> {
    DOMAIN_EVENTS.iter().find(|def| def.name == name)
}

/// Definitions a module is responsible for registering.
pub fn definitions_owned_by(owner: ModuleId) -> impl Iterator<Item = &'static EventDefinition> {
    DOMAIN_EVENTS.iter().filter(move |def| def.owner == owner)
}
