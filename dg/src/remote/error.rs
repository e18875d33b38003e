//! Remote call error types and retry classification

use std::time::Duration;
use thiserror::Error;

/// Substrings (matched case-insensitively) that mark a failure as transient
pub const RETRIABLE_MARKERS: [&str; 3] = ["503", "unavailable", "overloaded"];

/// HTTP statuses the service uses for "try again later"
const RETRIABLE_STATUSES: [u16; 2] = [503, 529];

/// Whether a failure is worth another attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// Transient service condition: back off and try again
    Retriable,
    /// Permanent for this request: surface immediately
    Fatal,
}

impl ErrorClass {
    pub fn is_retriable(self) -> bool {
        matches!(self, ErrorClass::Retriable)
    }
}

/// Classify free-form error text with the keyword rule
///
/// Used for errors that carry no explicit classification.
pub fn classify_message(text: &str) -> ErrorClass {
    let lowered = text.to_lowercase();
    if RETRIABLE_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        ErrorClass::Retriable
    } else {
        ErrorClass::Fatal
    }
}

/// Errors produced by a remote generative-service call
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Missing credential or other local misconfiguration
    #[error("{0}")]
    Configuration(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Error reported by the collaborator layer, optionally pre-classified
    #[error("{message}")]
    Service { message: String, class: Option<ErrorClass> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    /// The task was dropped or panicked before it could settle
    #[error("Operation aborted: {0}")]
    Aborted(String),
}

impl RemoteError {
    /// Unclassified service error; the keyword rule decides its class
    pub fn service(message: impl Into<String>) -> Self {
        RemoteError::Service {
            message: message.into(),
            class: None,
        }
    }

    /// Service error explicitly tagged as transient
    pub fn retriable(message: impl Into<String>) -> Self {
        RemoteError::Service {
            message: message.into(),
            class: Some(ErrorClass::Retriable),
        }
    }

    /// Service error explicitly tagged as permanent
    pub fn fatal(message: impl Into<String>) -> Self {
        RemoteError::Service {
            message: message.into(),
            class: Some(ErrorClass::Fatal),
        }
    }

    /// Classify this error for the retry executor
    ///
    /// Explicit tags and known statuses win; everything else falls back to
    /// matching the rendered message against [`RETRIABLE_MARKERS`].
    pub fn class(&self) -> ErrorClass {
        match self {
            RemoteError::Configuration(_) | RemoteError::Timeout(_) | RemoteError::Aborted(_) => ErrorClass::Fatal,
            RemoteError::Api { status, .. } if RETRIABLE_STATUSES.contains(status) => ErrorClass::Retriable,
            RemoteError::Service { class: Some(class), .. } => *class,
            other => classify_message(&other.to_string()),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.class().is_retriable()
    }
}
