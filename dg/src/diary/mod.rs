//! Diary use cases
//!
//! Place search, entry text, sketches and daily summaries, each submitted
//! through a shared [`Governor`](crate::governor::Governor).

mod service;

pub use service::DiaryService;
