//! Governor implementation

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use super::config::GovernorConfig;
use super::observer::QueueObserver;
use super::queue::{QueueState, TaskQueue, Ticket};
use super::retry::{Precondition, RetryExecutor};
use crate::remote::RemoteError;

/// The Governor paces every outbound call through one queue and wraps each
/// call in retry with exponential backoff.
///
/// Retries happen inside the dispatched slot: a call that is backing off
/// still counts against the concurrency limit.
#[derive(Clone)]
pub struct Governor {
    queue: TaskQueue,
    executor: Arc<RetryExecutor>,
}

impl Governor {
    /// Create a new governor with the given configuration
    pub fn new(config: &GovernorConfig) -> Self {
        debug!(?config, "Governor::new: called");
        Self {
            queue: TaskQueue::new(config.queue_config()),
            executor: Arc::new(RetryExecutor::new(config.retry_policy())),
        }
    }

    /// Create a new governor reporting queue transitions to `observer`
    pub fn with_observer(config: &GovernorConfig, observer: QueueObserver) -> Self {
        debug!(?config, "Governor::with_observer: called");
        Self {
            queue: TaskQueue::with_observer(config.queue_config(), observer),
            executor: Arc::new(RetryExecutor::new(config.retry_policy())),
        }
    }

    /// Check `precondition` before every attempt of every call
    pub fn with_precondition(self, precondition: Precondition) -> Self {
        let executor = RetryExecutor::clone(&self.executor).with_precondition(precondition);
        Self {
            queue: self.queue,
            executor: Arc::new(executor),
        }
    }

    /// Queue `operation` and retry it on transient failure
    pub fn submit<T, F, Fut>(&self, operation: F) -> Ticket<T>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RemoteError>> + Send + 'static,
    {
        let executor = Arc::clone(&self.executor);
        self.queue.enqueue(move || async move { executor.run(operation).await })
    }

    pub fn set_observer(&self, observer: QueueObserver) {
        self.queue.set_observer(observer);
    }

    pub fn queue(&self) -> &TaskQueue {
        &self.queue
    }

    pub fn queue_state(&self) -> QueueState {
        self.queue.state()
    }
}
