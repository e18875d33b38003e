//! Remote service boundary
//!
//! Error classification and the client trait the diary use cases call through.

pub mod client;
mod error;
mod types;

pub use client::GenerativeClient;
pub use error::{ErrorClass, RETRIABLE_MARKERS, RemoteError, classify_message};
pub use types::{DaySummary, DiaryEntry, ImageCandidate, PLACE_DETAILS_MAX_CHARS, Place, PlaceCandidate, SketchRequest};
