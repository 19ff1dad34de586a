//! # Event Catalog
//!
//! The single source of truth for which events exist and what their payloads
//! must contain. Populated during startup, then read on every publish.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::BusError;
use crate::event::Payload;

/// Expected payload shape for one event name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSchema {
    name: String,
    required: BTreeSet<String>,
    optional: BTreeSet<String>,
    allow_unknown: bool,
}

impl EventSchema {
    /// Schema with no fields. Add fields with [`required`](Self::required)
    /// and [`optional`](Self::optional).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: BTreeSet::new(),
            optional: BTreeSet::new(),
            allow_unknown: false,
        }
    }

    #[must_use]
    pub fn required<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(fields.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn optional<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.optional.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Accept payload fields that are neither required nor optional.
    #[must_use]
    pub fn allow_unknown_fields(mut self) -> Self {
        self.allow_unknown = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn required_fields(&self) -> &BTreeSet<String> {
        &self.required
    }

    #[must_use]
    pub fn optional_fields(&self) -> &BTreeSet<String> {
        &self.optional
    }

    /// Check a payload against this schema.
    ///
    /// # Errors
    ///
    /// [`BusError::SchemaViolation`] listing every missing required field and,
    /// unless unknown fields are allowed, every unexpected field.
    pub fn check(&self, payload: &Payload) -> Result<(), BusError> {
        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|field| !payload.contains_key(field.as_str()))
            .cloned()
            .collect();

        let mut unexpected: Vec<String> = if self.allow_unknown {
            Vec::new()
        } else {
            payload
                .keys()
                .filter(|key| !self.required.contains(*key) && !self.optional.contains(*key))
                .cloned()
                .collect()
        };
        unexpected.sort();

        if missing.is_empty() && unexpected.is_empty() {
            return Ok(());
        }

        Err(BusError::SchemaViolation {
            name: self.name.clone(),
            missing,
            unexpected,
        })
    }
}

/// Registry of event schemas keyed by event name.
#[derive(Debug, Default)]
pub struct EventCatalog {
    schemas: RwLock<HashMap<String, Arc<EventSchema>>>,
}

impl EventCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema.
    ///
    /// Registering an identical schema twice is a no-op.
    ///
    /// # Errors
    ///
    /// [`BusError::DuplicateEvent`] if the name is taken by a different schema.
    pub fn register(&self, schema: EventSchema) -> Result<(), BusError> {
        let mut schemas = self.schemas.write();

        if let Some(existing) = schemas.get(schema.name()) {
            if **existing == schema {
                return Ok(());
            }
            return Err(BusError::DuplicateEvent {
                name: schema.name().to_string(),
            });
        }

        debug!(
            event = %schema.name(),
            required = schema.required.len(),
            optional = schema.optional.len(),
            "Event registered in catalog"
        );
        schemas.insert(schema.name().to_string(), Arc::new(schema));
        Ok(())
    }

    /// Validate a payload against the schema registered for `name`.
    ///
    /// # Errors
    ///
    /// [`BusError::UnknownEvent`] if `name` is not registered, otherwise
    /// [`BusError::SchemaViolation`] when the payload does not fit.
    pub fn validate(&self, name: &str, payload: &Payload) -> Result<(), BusError> {
        let schema = self.get(name).ok_or_else(|| BusError::UnknownEvent {
            name: name.to_string(),
        })?;
        schema.check(payload)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<EventSchema>> {
        self.schemas.read().get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.read().contains_key(name)
    }

    /// All registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schemas.read().keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> Payload {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("test payload must be an object"),
        }
    }

    fn resource_created() -> EventSchema {
        EventSchema::new("resource.created")
            .required(["resource_id", "title"])
            .optional(["source_url"])
    }

    #[test]
    fn test_validate_accepts_matching_payload() {
        let catalog = EventCatalog::new();
        catalog.register(resource_created()).unwrap();

        let ok = payload(json!({"resource_id": "r-1", "title": "x", "source_url": "http://a"}));
        assert!(catalog.validate("resource.created", &ok).is_ok());
    }

    #[test]
    fn test_validate_unknown_event() {
        let catalog = EventCatalog::new();
        let err = catalog.validate("unregistered.event", &Payload::new()).unwrap_err();
        assert_eq!(err, BusError::UnknownEvent { name: "unregistered.event".into() });
    }

    #[test]
    fn test_validate_reports_missing_and_unexpected() {
        let catalog = EventCatalog::new();
        catalog.register(resource_created()).unwrap();

        let bad = payload(json!({"title": "x", "zeta": 1, "alpha": 2}));
        let err = catalog.validate("resource.created", &bad).unwrap_err();
        assert_eq!(
            err,
            BusError::SchemaViolation {
                name: "resource.created".into(),
                missing: vec!["resource_id".into()],
                unexpected: vec!["alpha".into(), "zeta".into()],
            }
        );
    }

    #[test]
    fn test_allow_unknown_fields() {
        let catalog = EventCatalog::new();
        catalog
            .register(EventSchema::new("search.executed").required(["query"]).allow_unknown_fields())
            .unwrap();

        let extra = payload(json!({"query": "rust", "client": "web"}));
        assert!(catalog.validate("search.executed", &extra).is_ok());
    }

    #[test]
    fn test_duplicate_registration() {
        let catalog = EventCatalog::new();
        catalog.register(resource_created()).unwrap();

        // Same schema again is idempotent.
        assert!(catalog.register(resource_created()).is_ok());
        assert_eq!(catalog.len(), 1);

        let different = EventSchema::new("resource.created").required(["resource_id"]);
        assert_eq!(
            catalog.register(different).unwrap_err(),
            BusError::DuplicateEvent { name: "resource.created".into() }
        );
    }

    #[test]
    fn test_names_sorted() {
        let catalog = EventCatalog::new();
        catalog.register(EventSchema::new("quality.computed")).unwrap();
        catalog.register(EventSchema::new("annotation.created")).unwrap();

        assert_eq!(catalog.names(), vec!["annotation.created", "quality.computed"]);
        assert!(catalog.contains("quality.computed"));
        assert!(!catalog.is_empty());
    }
}
