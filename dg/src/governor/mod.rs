//! Outbound request governor
//!
//! Bounds how many remote calls are in flight, spaces dispatches after each
//! settlement, and retries transient failures with exponential backoff.

mod config;
mod core;
mod observer;
mod queue;
mod retry;

pub use config::GovernorConfig;
pub use self::core::Governor;
pub use observer::{ObserverSlot, QueueObserver, logging_observer};
pub use queue::{QueueConfig, QueueState, QueueStats, TaskQueue, Ticket};
pub use retry::{Precondition, RetryExecutor, RetryPolicy, with_retry};
