//! # Domain Modules
//!
//! Identities of the domain modules that make up the knowledge base. A
//! module's name doubles as its directory name under `modules/` and as the
//! prefix of the events it owns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name a domain module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown module: '{0}'")]
pub struct UnknownModule(pub String);

/// Domain module identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleId {
    /// Resource lifecycle (create, update, delete).
    Resources,
    /// Content fetching and extraction pipeline.
    Ingestion,
    /// User-curated groupings of resources.
    Collections,
    /// Highlights and notes on resources.
    Annotations,
    /// Full-text and hybrid search index.
    Search,
    /// Quality scoring and outlier detection.
    Quality,
    /// Classification tree.
    Taxonomy,
    /// Citation and relationship graph.
    Graph,
    /// Scholarly metadata and citation extraction.
    Scholarly,
    /// User interactions and recommendations.
    Recommendations,
    /// Review queue.
    Curation,
    /// Controlled vocabularies.
    Authority,
    /// Operational monitoring.
    Monitoring,
}

impl ModuleId {
    /// Fixed initialisation order used by the composition root.
    ///
    /// Event owners come before their consumers so every catalog entry a
    /// module subscribes to is registered by then.
    pub const INIT_ORDER: [ModuleId; 13] = [
        Self::Resources,
        Self::Ingestion,
        Self::Collections,
        Self::Annotations,
        Self::Search,
        Self::Quality,
        Self::Taxonomy,
        Self::Graph,
        Self::Scholarly,
        Self::Recommendations,
        Self::Curation,
        Self::Authority,
        Self::Monitoring,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resources => "resources",
            Self::Ingestion => "ingestion",
            Self::Collections => "collections",
            Self::Annotations => "annotations",
            Self::Search => "search",
            Self::Quality => "quality",
            Self::Taxonomy => "taxonomy",
            Self::Graph => "graph",
            Self::Scholarly => "scholarly",
            Self::Recommendations => "recommendations",
            Self::Curation => "curation",
            Self::Authority => "authority",
            Self::Monitoring => "monitoring",
        }
    }

    /// All modules in initialisation order.
    #[must_use]
    pub fn all() -> &'static [ModuleId] {
        &Self::INIT_ORDER
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModuleId {
    type Err = UnknownModule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::INIT_ORDER
            .iter()
            .copied()
            .find(|id| id.name() == s)
            .ok_or_else(|| UnknownModule(s.to_string()))
    }
}
