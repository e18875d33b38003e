//! Bounded-concurrency request queue with post-settlement spacing

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use super::observer::{ObserverSlot, QueueObserver};
use crate::remote::RemoteError;

/// Hands a settled result to the waiting ticket
type Deliver = Box<dyn FnOnce() + Send>;

/// Type-erased task body; resolves to whether the operation succeeded and
/// the delivery of its result, run only after the slot is released
type Job = Box<dyn FnOnce() -> BoxFuture<'static, (bool, Deliver)> + Send>;

/// Queue limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    /// Max operations in flight (always >= 1)
    pub max_concurrency: usize,

    /// Wait after a settlement before that slot dispatches again
    pub request_delay: Duration,

    /// Settle a dispatched operation as timed out after this long
    pub operation_timeout: Option<Duration>,
}

impl QueueConfig {
    pub fn new(max_concurrency: usize, request_delay: Duration) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            request_delay,
            operation_timeout: None,
        }
    }

    pub fn with_timeout(mut self, operation_timeout: Option<Duration>) -> Self {
        self.operation_timeout = operation_timeout;
        self
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(1000))
    }
}

/// Statistics for the queue
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueueStats {
    pub total_enqueued: u64,
    pub total_dispatched: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub peak_active: usize,
    pub peak_waiting: usize,
}

/// Point-in-time view of the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueState {
    pub active: usize,
    pub waiting: usize,
    pub stats: QueueStats,
}

/// An operation waiting for a slot
struct QueuedTask {
    id: Uuid,
    enqueued_at: Instant,
    job: Job,
}

/// Internal state protected by mutex
struct QueueInner {
    active: usize,
    pending: VecDeque<QueuedTask>,
    stats: QueueStats,
}

struct Shared {
    config: QueueConfig,
    inner: Mutex<QueueInner>,
    observer: ObserverSlot,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Report counts while the caller still holds the state lock
    fn notify(&self, inner: &QueueInner) {
        self.observer.notify(inner.active, inner.pending.len());
    }

    fn try_dispatch(self: &Arc<Self>) {
        let task = {
            let mut inner = self.lock();
            if inner.active >= self.config.max_concurrency {
                debug!(active = inner.active, "TaskQueue::try_dispatch: all slots busy");
                return;
            }
            let Some(task) = inner.pending.pop_front() else {
                debug!("TaskQueue::try_dispatch: nothing pending");
                return;
            };
            inner.active += 1;
            inner.stats.total_dispatched += 1;
            inner.stats.peak_active = inner.stats.peak_active.max(inner.active);
            self.notify(&inner);
            task
        };

        debug!(
            task_id = %task.id,
            waited_ms = task.enqueued_at.elapsed().as_millis() as u64,
            "TaskQueue::try_dispatch: dispatching"
        );

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let (succeeded, deliver) = (task.job)().await;
            shared.settle(task.id, succeeded);
            deliver();
            tokio::time::sleep(shared.config.request_delay).await;
            shared.try_dispatch();
        });
    }

    fn settle(&self, id: Uuid, succeeded: bool) {
        let mut inner = self.lock();
        inner.active -= 1;
        if succeeded {
            inner.stats.total_succeeded += 1;
        } else {
            inner.stats.total_failed += 1;
        }
        self.notify(&inner);
        debug!(task_id = %id, succeeded, active = inner.active, "TaskQueue::settle: slot released");
    }
}

/// Future returned by [`TaskQueue::enqueue`], resolving to the operation's result
#[must_use = "a ticket does nothing unless awaited; the operation still runs if dropped"]
pub struct Ticket<T> {
    id: Uuid,
    rx: oneshot::Receiver<Result<T, RemoteError>>,
}

impl<T> Ticket<T> {
    /// Identifier used for this task in log events
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl<T> Future for Ticket<T> {
    type Output = Result<T, RemoteError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll(cx).map(|received| {
            received.unwrap_or_else(|_| Err(RemoteError::Aborted("task dropped before settlement".to_string())))
        })
    }
}

/// Serializes remote calls behind a concurrency limit and a spacing delay
///
/// Waiting tasks dispatch in submission order. Cloning yields another handle
/// to the same queue. Must be used from within a Tokio runtime.
#[derive(Clone)]
pub struct TaskQueue {
    shared: Arc<Shared>,
}

impl TaskQueue {
    /// Create a new queue with no observer
    pub fn new(config: QueueConfig) -> Self {
        Self::build(config, None)
    }

    /// Create a new queue reporting to `observer`
    pub fn with_observer(config: QueueConfig, observer: QueueObserver) -> Self {
        Self::build(config, Some(observer))
    }

    fn build(mut config: QueueConfig, observer: Option<QueueObserver>) -> Self {
        config.max_concurrency = config.max_concurrency.max(1);
        debug!(?config, "TaskQueue::new: called");
        Self {
            shared: Arc::new(Shared {
                config,
                inner: Mutex::new(QueueInner {
                    active: 0,
                    pending: VecDeque::new(),
                    stats: QueueStats::default(),
                }),
                observer: ObserverSlot::new(observer),
            }),
        }
    }

    pub fn config(&self) -> QueueConfig {
        self.shared.config
    }

    /// Replace the observer
    ///
    /// The observer runs inline while the queue's state lock is held and must
    /// not call back into this queue.
    pub fn set_observer(&self, observer: QueueObserver) {
        self.shared.observer.set(observer);
    }

    pub fn clear_observer(&self) {
        self.shared.observer.clear();
    }

    /// Submit an operation; returns immediately with a ticket for its result
    pub fn enqueue<T, F, Fut>(&self, operation: F) -> Ticket<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let id = Uuid::now_v7();
        let (tx, rx) = oneshot::channel();
        let timeout = self.shared.config.operation_timeout;

        let job: Job = Box::new(move || {
            async move {
                let guarded = AssertUnwindSafe(async move { operation().await }).catch_unwind();
                let outcome = match timeout {
                    Some(limit) => tokio::time::timeout(limit, guarded)
                        .await
                        .unwrap_or_else(|_| Ok(Err(RemoteError::Timeout(limit)))),
                    None => guarded.await,
                };
                let result = outcome.unwrap_or_else(|_| {
                    warn!(task_id = %id, "Queued operation panicked");
                    Err(RemoteError::Aborted("operation panicked".to_string()))
                });
                let succeeded = result.is_ok();
                let deliver: Deliver = Box::new(move || {
                    // receiver gone means the caller stopped listening
                    let _ = tx.send(result);
                });
                (succeeded, deliver)
            }
            .boxed()
        });

        {
            let mut inner = self.shared.lock();
            inner.pending.push_back(QueuedTask {
                id,
                enqueued_at: Instant::now(),
                job,
            });
            inner.stats.total_enqueued += 1;
            inner.stats.peak_waiting = inner.stats.peak_waiting.max(inner.pending.len());
            self.shared.notify(&inner);
            debug!(task_id = %id, waiting = inner.pending.len(), "TaskQueue::enqueue: queued");
        }

        self.shared.try_dispatch();
        Ticket { id, rx }
    }

    /// Get current queue state
    pub fn state(&self) -> QueueState {
        let inner = self.shared.lock();
        QueueState {
            active: inner.active,
            waiting: inner.pending.len(),
            stats: inner.stats.clone(),
        }
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new(QueueConfig::default())
    }
}
