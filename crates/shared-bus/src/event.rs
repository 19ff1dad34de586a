//! # Events
//!
//! An [`Event`] is a named, immutable message. Once constructed its fields
//! can only be read; the bus wraps it in an `Arc` before fan-out so every
//! handler observes the same instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::BusError;

/// Ordered field -> value mapping carried by every event.
pub type Payload = Map<String, Value>;

/// A domain event flowing through the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    name: String,
    payload: Payload,
    timestamp: DateTime<Utc>,
    correlation_id: Uuid,
}

impl Event {
    /// Create an event with a fresh correlation id.
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
            timestamp: Utc::now(),
            correlation_id: Uuid::new_v4(),
        }
    }

    /// Create an event from a JSON object literal.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::PayloadNotObject`] if `value` is not an object.
    pub fn from_json(name: impl Into<String>, value: Value) -> Result<Self, BusError> {
        let name = name.into();
        match value {
            Value::Object(payload) => Ok(Self::new(name, payload)),
            _ => Err(BusError::PayloadNotObject { name }),
        }
    }

    /// Create a follow-up event that shares `cause`'s correlation id.
    pub fn caused_by(name: impl Into<String>, payload: Payload, cause: &Event) -> Self {
        Self::new(name, payload).with_correlation_id(cause.correlation_id)
    }

    /// Override the correlation id.
    #[must_use]
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Catalog name, e.g. `resource.created`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Look up a single payload field.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.payload.get(key)
    }

    /// Look up a payload field as a string.
    #[must_use]
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
