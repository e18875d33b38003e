//! GenerativeClient trait definition

use async_trait::async_trait;

use super::{DiaryEntry, ImageCandidate, PlaceCandidate, RemoteError, SketchRequest};

/// Stateless client for the remote generative service
///
/// Implementations own prompt construction and the wire protocol. Every call
/// is independent; retry and pacing are applied by the governor around it,
/// so implementations should make exactly one request per call.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Look up places matching `query` using map grounding
    async fn search_places(&self, query: &str) -> Result<Vec<PlaceCandidate>, RemoteError>;

    /// Write diary text from a voice transcription
    async fn write_entry(&self, transcription: &str, place_name: Option<&str>) -> Result<String, RemoteError>;

    /// Redraw a photo as a sketch
    async fn draw_sketch(&self, request: &SketchRequest) -> Result<ImageCandidate, RemoteError>;

    /// Summarize a day; returns the raw JSON document produced by the model
    async fn summarize(&self, entries: &[DiaryEntry]) -> Result<String, RemoteError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    /// Scripted client for unit tests
    ///
    /// Each method pops its next scripted result; an exhausted script yields a
    /// fatal error.
    #[derive(Default)]
    pub struct MockGenerativeClient {
        pub places: Mutex<VecDeque<Result<Vec<PlaceCandidate>, RemoteError>>>,
        pub entries: Mutex<VecDeque<Result<String, RemoteError>>>,
        pub sketches: Mutex<VecDeque<Result<ImageCandidate, RemoteError>>>,
        pub summaries: Mutex<VecDeque<Result<String, RemoteError>>>,
        call_count: AtomicUsize,
    }

    impl MockGenerativeClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_entries(results: Vec<Result<String, RemoteError>>) -> Self {
            let client = Self::new();
            *client.entries.lock().unwrap() = results.into();
            client
        }

        pub fn with_places(results: Vec<Result<Vec<PlaceCandidate>, RemoteError>>) -> Self {
            let client = Self::new();
            *client.places.lock().unwrap() = results.into();
            client
        }

        pub fn with_sketches(results: Vec<Result<ImageCandidate, RemoteError>>) -> Self {
            let client = Self::new();
            *client.sketches.lock().unwrap() = results.into();
            client
        }

        pub fn with_summaries(results: Vec<Result<String, RemoteError>>) -> Self {
            let client = Self::new();
            *client.summaries.lock().unwrap() = results.into();
            client
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        fn next<T>(&self, script: &Mutex<VecDeque<Result<T, RemoteError>>>) -> Result<T, RemoteError> {
            let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
            debug!(%idx, "MockGenerativeClient::next: called");
            script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RemoteError::fatal("No more mock responses")))
        }
    }

    #[async_trait]
    impl GenerativeClient for MockGenerativeClient {
        async fn search_places(&self, _query: &str) -> Result<Vec<PlaceCandidate>, RemoteError> {
            self.next(&self.places)
        }

        async fn write_entry(&self, _transcription: &str, _place_name: Option<&str>) -> Result<String, RemoteError> {
            self.next(&self.entries)
        }

        async fn draw_sketch(&self, _request: &SketchRequest) -> Result<ImageCandidate, RemoteError> {
            self.next(&self.sketches)
        }

        async fn summarize(&self, _entries: &[DiaryEntry]) -> Result<String, RemoteError> {
            self.next(&self.summaries)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_returns_scripted_results() {
            let client = MockGenerativeClient::with_entries(vec![Ok("first".to_string()), Ok("second".to_string())]);

            assert_eq!(client.write_entry("t", None).await.unwrap(), "first");
            assert_eq!(client.write_entry("t", Some("Cafe")).await.unwrap(), "second");
            assert_eq!(client.call_count(), 2);
        }

        #[tokio::test]
        async fn test_mock_client_errors_when_exhausted() {
            let client = MockGenerativeClient::new();
            let err = client.summarize(&[]).await.unwrap_err();
            assert!(!err.is_retryable());
        }
    }
}
