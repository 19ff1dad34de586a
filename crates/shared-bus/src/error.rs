//! # Bus Errors
//!
//! Two families, kept apart on purpose:
//!
//! - [`BusError`] is raised to the caller of `register`/`subscribe`/`publish`.
//!   It always means the call itself was malformed.
//! - [`HandlerError`] never crosses the publisher boundary. It is carried
//!   inside [`Outcome::Failure`](crate::Outcome) once the isolation wrapper
//!   has caught it.

use std::any::Any;
use std::time::Duration;

use thiserror::Error;

/// Errors surfaced synchronously to publishers and registrants.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    /// The event name is not present in the catalog.
    #[error("unknown event: '{name}' is not registered in the event catalog")]
    UnknownEvent { name: String },

    /// The payload does not match the registered schema.
    #[error("schema violation for '{name}': missing {missing:?}, unexpected {unexpected:?}")]
    SchemaViolation {
        name: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// The event name is already registered with a different schema.
    #[error("duplicate event: '{name}' is already registered with a different schema")]
    DuplicateEvent { name: String },

    /// A JSON value used to build a payload was not an object.
    #[error("payload for '{name}' must be a JSON object")]
    PayloadNotObject { name: String },

    /// The bus was constructed outside of a Tokio runtime.
    #[error("no Tokio runtime available to host the delivery worker pool")]
    NoRuntime,

    /// Rejected configuration value.
    #[error("invalid bus configuration: {0}")]
    InvalidConfig(String),
}

/// A handler-level failure, caught and recorded by the isolation wrapper.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler failed: {message}")]
    Failed {
        /// Display form of the error.
        message: String,
        /// Cause chain (and backtrace when captured).
        detail: String,
    },

    /// The handler panicked.
    #[error("handler panicked: {message}")]
    Panicked {
        /// The panic payload, when it is a string.
        message: String,
        /// Panic location and stack.
        detail: String,
    },

    /// The handler exceeded its execution deadline.
    #[error("handler exceeded its {}ms deadline", .deadline.as_millis())]
    Timeout { deadline: Duration },

    /// The worker queue was full when the async delivery was submitted.
    #[error("worker queue full, async delivery rejected")]
    QueueFull,

    /// The worker pool was shut down before the delivery could run.
    #[error("worker pool closed, async delivery rejected")]
    PoolClosed,
}

impl HandlerError {
    pub(crate) fn from_anyhow(err: &anyhow::Error) -> Self {
        Self::Failed {
            message: err.to_string(),
            detail: format!("{err:?}"),
        }
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>, trace: Option<String>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::Panicked {
            message,
            detail: trace.unwrap_or_else(|| "panic location not recorded".to_string()),
        }
    }

    /// True for caught panics.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        matches!(self, Self::Panicked { .. })
    }

    /// Extended diagnostic text for logs, if any.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Failed { detail, .. } => Some(detail),
            Self::Panicked { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// True for deadline overruns.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
