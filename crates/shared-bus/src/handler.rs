//! # Handlers
//!
//! Handlers are plain functions from the bus's point of view. They return
//! `anyhow::Result<()>` and owe the bus nothing else: catching errors,
//! panics and overruns is the isolation wrapper's job.
//!
//! A [`Handler`] pairs the callable with an identity (used in logs and
//! results), its [`DeliveryMode`], and an optional per-handler deadline.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::event::Event;

/// Whether a handler runs on the publisher's call path or on the worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Inline, in registration order, before `publish` returns.
    Sync,
    /// Submitted to the bounded worker pool; fire-and-forget for the publisher.
    Async,
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sync => f.write_str("sync"),
            Self::Async => f.write_str("async"),
        }
    }
}

/// A handler executed inline on the publisher's thread.
pub trait SyncHandler: Send + Sync {
    fn handle(&self, event: &Event) -> anyhow::Result<()>;
}

impl<F> SyncHandler for F
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    fn handle(&self, event: &Event) -> anyhow::Result<()> {
        self(event)
    }
}

/// A handler executed on the delivery worker pool.
#[async_trait]
pub trait AsyncHandler: Send + Sync {
    async fn handle(&self, event: Arc<Event>) -> anyhow::Result<()>;
}

#[async_trait]
impl<F, Fut> AsyncHandler for F
where
    F: Fn(Arc<Event>) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    async fn handle(&self, event: Arc<Event>) -> anyhow::Result<()> {
        self(event).await
    }
}

#[derive(Clone)]
pub(crate) enum HandlerKind {
    Sync(Arc<dyn SyncHandler>),
    Async(Arc<dyn AsyncHandler>),
}

/// A callable plus the metadata the bus needs to deliver to it.
#[derive(Clone)]
pub struct Handler {
    identity: Arc<str>,
    kind: HandlerKind,
    timeout: Option<Duration>,
}

impl Handler {
    /// Wrap a synchronous closure.
    pub fn sync<F>(identity: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(&Event) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::from_sync(identity, handler)
    }

    /// Wrap any [`SyncHandler`] implementation.
    pub fn from_sync<H>(identity: impl Into<Arc<str>>, handler: H) -> Self
    where
        H: SyncHandler + 'static,
    {
        Self {
            identity: identity.into(),
            kind: HandlerKind::Sync(Arc::new(handler)),
            timeout: None,
        }
    }

    /// Wrap an asynchronous closure.
    pub fn asynchronous<F, Fut>(identity: impl Into<Arc<str>>, handler: F) -> Self
    where
        F: Fn(Arc<Event>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self::from_async(identity, handler)
    }

    /// Wrap any [`AsyncHandler`] implementation.
    pub fn from_async<H>(identity: impl Into<Arc<str>>, handler: H) -> Self
    where
        H: AsyncHandler + 'static,
    {
        Self {
            identity: identity.into(),
            kind: HandlerKind::Async(Arc::new(handler)),
            timeout: None,
        }
    }

    /// Per-handler execution deadline, overriding the bus default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    #[must_use]
    pub fn mode(&self) -> DeliveryMode {
        match self.kind {
            HandlerKind::Sync(_) => DeliveryMode::Sync,
            HandlerKind::Async(_) => DeliveryMode::Async,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn identity_arc(&self) -> Arc<str> {
        Arc::clone(&self.identity)
    }

    pub(crate) fn kind(&self) -> &HandlerKind {
        &self.kind
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("identity", &self.identity)
            .field("mode", &self.mode())
            .field("timeout", &self.timeout)
            .finish()
    }
}
