//! Diary Governor - paced, retrying access to a generative diary service
//!
//! Every remote call the diary makes (place search, entry text, sketches,
//! daily summaries) goes through one [`Governor`]: a queue that caps how many
//! calls are in flight and spaces dispatches, wrapped around a retry executor
//! that backs off exponentially on transient service errors.
//!
//! # Modules
//!
//! - [`governor`] - task queue, retry executor, observer hook
//! - [`remote`] - error classification and the client trait
//! - [`diary`] - diary use cases built on the governor
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod cli;
pub mod config;
pub mod diary;
pub mod governor;
pub mod remote;

// Re-export commonly used types
pub use config::{Config, CredentialsConfig};
pub use diary::DiaryService;
pub use governor::{
    Governor, GovernorConfig, QueueConfig, QueueObserver, QueueState, QueueStats, RetryExecutor, RetryPolicy,
    TaskQueue, Ticket, with_retry,
};
pub use remote::{ErrorClass, GenerativeClient, RemoteError, classify_message};
