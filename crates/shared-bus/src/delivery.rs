//! # Delivery Engine
//!
//! Synchronous subscribers run inline on the publisher's thread, one at a
//! time, in registration order. Asynchronous subscribers are submitted to a
//! bounded worker pool:
//!
//! ```text
//!  publish() ──► try_send ──► [ bounded mpsc queue ] ──► worker 0..N
//!                   │                                      │
//!                   └─ Full/Closed ─► HandlerResult         └─► oneshot reply
//!                                     (QueueFull/PoolClosed)
//! ```
//!
//! Submission never blocks: a full queue turns into a `QueueFull` failure
//! for that one subscription. Every accepted job is counted in flight until
//! its worker has recorded the result.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::runtime::Handle;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot, Mutex as AsyncMutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::HandlerError;
use crate::event::Event;
use crate::handler::{AsyncHandler, HandlerKind};
use crate::isolation::{self, HandlerResult, Outcome};
use crate::metrics::BusMetrics;
use crate::registry::{Snapshot, SubscriptionInfo};

struct AsyncJob {
    info: SubscriptionInfo,
    handler: Arc<dyn AsyncHandler>,
    event: Arc<Event>,
    deadline: Duration,
    reply: oneshot::Sender<HandlerResult>,
}

/// Counts accepted async jobs that have not produced a result yet.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: AtomicUsize,
    idle: Notify,
}

impl InFlight {
    fn start(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    fn finish(&self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }

    pub(crate) fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub(crate) async fn wait_idle(&self) {
        loop {
            // Register before checking so a finish() in between is not missed.
            let notified = self.idle.notified();
            if self.current() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// An async delivery that was accepted by the pool and has not been awaited.
#[derive(Debug)]
pub(crate) struct PendingDelivery {
    info: SubscriptionInfo,
    reply: oneshot::Receiver<HandlerResult>,
}

impl PendingDelivery {
    pub(crate) async fn wait(self) -> HandlerResult {
        match self.reply.await {
            Ok(result) => result,
            // Job dropped without running (runtime torn down under it).
            Err(_) => HandlerResult {
                subscription: self.info,
                outcome: Outcome::Failure(HandlerError::PoolClosed),
                duration: Duration::ZERO,
            },
        }
    }
}

/// Fixed-size pool of Tokio tasks draining one bounded queue.
pub(crate) struct WorkerPool {
    sender: RwLock<Option<mpsc::Sender<AsyncJob>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    in_flight: Arc<InFlight>,
    size: usize,
}

impl WorkerPool {
    pub(crate) fn spawn(
        runtime: &Handle,
        size: usize,
        queue_depth: usize,
        metrics: Arc<BusMetrics>,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(queue_depth);
        let queue = Arc::new(AsyncMutex::new(receiver));
        let in_flight = Arc::new(InFlight::default());

        let workers = (0..size)
            .map(|worker| {
                runtime.spawn(run_worker(
                    worker,
                    Arc::clone(&queue),
                    Arc::clone(&metrics),
                    Arc::clone(&in_flight),
                ))
            })
            .collect();

        debug!(workers = size, queue_depth, "Delivery worker pool started");

        Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
            in_flight,
            size,
        }
    }

    fn submit(
        &self,
        info: SubscriptionInfo,
        handler: Arc<dyn AsyncHandler>,
        event: Arc<Event>,
        deadline: Duration,
    ) -> Result<oneshot::Receiver<HandlerResult>, HandlerError> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            return Err(HandlerError::PoolClosed);
        };

        let (reply, receiver) = oneshot::channel();
        let job = AsyncJob {
            info,
            handler,
            event,
            deadline,
            reply,
        };

        self.in_flight.start();
        match sender.try_send(job) {
            Ok(()) => Ok(receiver),
            Err(TrySendError::Full(job)) => {
                self.in_flight.finish();
                warn!(
                    event = %job.event.name(),
                    handler = %job.info.handler,
                    "Worker queue full, rejecting async delivery"
                );
                Err(HandlerError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => {
                self.in_flight.finish();
                Err(HandlerError::PoolClosed)
            }
        }
    }

    pub(crate) fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    pub(crate) fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Stop accepting jobs, let queued jobs drain, then join the workers.
    pub(crate) async fn shutdown(&self) {
        let sender = self.sender.write().take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(err) = worker.await {
                warn!(error = %err, "Delivery worker did not stop cleanly");
            }
        }
        debug!("Delivery worker pool stopped");
    }
}

async fn run_worker(
    worker: usize,
    queue: Arc<AsyncMutex<mpsc::Receiver<AsyncJob>>>,
    metrics: Arc<BusMetrics>,
    in_flight: Arc<InFlight>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        let AsyncJob {
            info,
            handler,
            event,
            deadline,
            reply,
        } = job;

        let result = isolation::invoke_async(info, handler, event, deadline).await;
        metrics.record_result(&result);
        // Finish before replying: a holder of the result never sees its job in flight.
        in_flight.finish();
        // The publisher may have dropped its PublishResult; that is fine.
        let _ = reply.send(result);
    }
    debug!(worker, "Delivery worker exiting");
}

/// What one `deliver` call produced.
pub(crate) struct Delivery {
    /// Sync results (registration order) followed by async enqueue rejections.
    pub completed: Vec<HandlerResult>,
    /// Async deliveries accepted by the pool.
    pub pending: Vec<PendingDelivery>,
    /// Time spent inside sync handler bodies.
    pub handler_time: Duration,
}

/// Runs one publish snapshot: async fan-out, then the sync batch.
pub(crate) struct DeliveryEngine {
    pool: WorkerPool,
    metrics: Arc<BusMetrics>,
    default_deadline: Duration,
}

impl DeliveryEngine {
    pub(crate) fn new(pool: WorkerPool, metrics: Arc<BusMetrics>, default_deadline: Duration) -> Self {
        Self {
            pool,
            metrics,
            default_deadline,
        }
    }

    pub(crate) fn deliver(&self, event: &Arc<Event>, snapshot: &Snapshot) -> Delivery {
        let (sync_subs, async_subs): (Vec<_>, Vec<_>) = snapshot
            .iter()
            .partition(|sub| matches!(sub.handler().kind(), HandlerKind::Sync(_)));

        let mut rejected = Vec::new();
        let mut pending = Vec::with_capacity(async_subs.len());

        for sub in async_subs {
            let HandlerKind::Async(handler) = sub.handler().kind() else {
                continue;
            };
            let info = sub.info();
            let submitted = self.pool.submit(
                info.clone(),
                Arc::clone(handler),
                Arc::clone(event),
                sub.deadline(self.default_deadline),
            );

            match submitted {
                Ok(reply) => pending.push(PendingDelivery { info, reply }),
                Err(err) => {
                    let result = isolation::reject(info, event, err);
                    self.metrics.record_result(&result);
                    rejected.push(result);
                }
            }
        }

        let mut completed = Vec::with_capacity(sync_subs.len() + rejected.len());
        let mut handler_time = Duration::ZERO;

        for sub in sync_subs {
            let HandlerKind::Sync(handler) = sub.handler().kind() else {
                continue;
            };
            let result = isolation::invoke_sync(
                sub.info(),
                handler.as_ref(),
                event,
                sub.deadline(self.default_deadline),
            );
            handler_time += result.duration;
            self.metrics.record_result(&result);
            completed.push(result);
        }

        completed.extend(rejected);

        Delivery {
            completed,
            pending,
            handler_time,
        }
    }

    pub(crate) fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}
