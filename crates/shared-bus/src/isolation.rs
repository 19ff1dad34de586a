//! # Failure Isolation
//!
//! Every handler invocation goes through [`invoke_sync`] or [`invoke_async`].
//! Errors, panics and deadline overruns are caught here, logged with the
//! event and handler identity, and turned into a [`HandlerResult`]. Nothing
//! a handler does can abort delivery to its siblings or reach the publisher.
//!
//! A chained panic hook records where each panic happened, with a stack, so
//! the failure log line points at the handler's code and not at the bus.

use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

use futures::FutureExt;
use tracing::{debug, error};

use crate::error::HandlerError;
use crate::event::Event;
use crate::handler::{AsyncHandler, SyncHandler};
use crate::registry::SubscriptionInfo;

thread_local! {
    /// Location and stack of the latest panic on this thread.
    static LAST_PANIC: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook that records each panic's location and stack. The hook
/// that was installed before still runs.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let location = info
                .location()
                .map_or_else(|| "unknown location".to_string(), ToString::to_string);
            let trace = format!("panicked at {location}\n{}", Backtrace::force_capture());
            let _ = LAST_PANIC.try_with(|last| *last.borrow_mut() = Some(trace));
            previous(info);
        }));
    });
}

fn take_panic_trace() -> Option<String> {
    LAST_PANIC.try_with(|last| last.borrow_mut().take()).ok().flatten()
}

/// What happened to one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(HandlerError),
}

/// Per-invocation record. Produced once per subscription in a publish snapshot.
#[derive(Debug, Clone)]
pub struct HandlerResult {
    pub subscription: SubscriptionInfo,
    pub outcome: Outcome,
    pub duration: Duration,
}

impl HandlerResult {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success)
    }

    #[must_use]
    pub fn error(&self) -> Option<&HandlerError> {
        match &self.outcome {
            Outcome::Success => None,
            Outcome::Failure(err) => Some(err),
        }
    }

    #[must_use]
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }

    #[must_use]
    pub fn handler(&self) -> &str {
        &self.subscription.handler
    }
}

/// Run a synchronous handler on the current thread.
///
/// The call cannot be pre-empted, so an overrun is detected after the
/// handler returns and reported as [`HandlerError::Timeout`].
pub(crate) fn invoke_sync(
    info: SubscriptionInfo,
    handler: &dyn SyncHandler,
    event: &Event,
    deadline: Duration,
) -> HandlerResult {
    install_panic_hook();
    let started = Instant::now();
    let caught = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event)));
    let duration = started.elapsed();

    let outcome = match caught {
        Ok(Ok(())) if duration > deadline => Outcome::Failure(HandlerError::Timeout { deadline }),
        Ok(Ok(())) => Outcome::Success,
        Ok(Err(err)) => Outcome::Failure(HandlerError::from_anyhow(&err)),
        Err(payload) => Outcome::Failure(HandlerError::from_panic(payload, take_panic_trace())),
    };

    finish(info, event, outcome, duration)
}

/// Run an asynchronous handler under `deadline`.
///
/// A timed-out future is dropped, which cancels it at its next await point.
pub(crate) async fn invoke_async(
    info: SubscriptionInfo,
    handler: Arc<dyn AsyncHandler>,
    event: Arc<Event>,
    deadline: Duration,
) -> HandlerResult {
    install_panic_hook();
    let started = Instant::now();
    let guarded = AssertUnwindSafe(handler.handle(Arc::clone(&event))).catch_unwind();

    let outcome = match tokio::time::timeout(deadline, guarded).await {
        Err(_elapsed) => Outcome::Failure(HandlerError::Timeout { deadline }),
        Ok(Ok(Ok(()))) => Outcome::Success,
        Ok(Ok(Err(err))) => Outcome::Failure(HandlerError::from_anyhow(&err)),
        Ok(Err(payload)) => Outcome::Failure(HandlerError::from_panic(payload, take_panic_trace())),
    };

    finish(info, &event, outcome, started.elapsed())
}

/// Record a delivery that never reached the handler (queue full, pool closed).
pub(crate) fn reject(info: SubscriptionInfo, event: &Event, err: HandlerError) -> HandlerResult {
    finish(info, event, Outcome::Failure(err), Duration::ZERO)
}

fn finish(info: SubscriptionInfo, event: &Event, outcome: Outcome, duration: Duration) -> HandlerResult {
    match &outcome {
        Outcome::Success => debug!(
            event = %event.name(),
            correlation_id = %event.correlation_id(),
            handler = %info.handler,
            mode = %info.mode,
            duration_us = duration.as_micros() as u64,
            "Handler completed"
        ),
        Outcome::Failure(err) => error!(
            event = %event.name(),
            correlation_id = %event.correlation_id(),
            handler = %info.handler,
            mode = %info.mode,
            error = %err,
            detail = err.detail().unwrap_or_default(),
            duration_us = duration.as_micros() as u64,
            "Handler failed, delivery to remaining handlers continues"
        ),
    }

    HandlerResult {
        subscription: info,
        outcome,
        duration,
    }
}
