//! Data exchanged with the generative service

use serde::{Deserialize, Serialize};

/// Maximum characters kept in a place's details line
pub const PLACE_DETAILS_MAX_CHARS: usize = 100;

/// A single diary entry as stored by the application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub date: String,
    pub original_photo_url: String,
    pub transcription: String,
    pub generated_text: String,
    pub generated_image_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_name: Option<String>,
}

/// Summary of a whole day of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub summary: String,
    /// Emotion score, nominally 1-10
    pub score: i64,
}

/// A place offered to the user after a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub details: String,
}

/// Raw map-grounding result returned by the client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceCandidate {
    pub title: Option<String>,
    pub uri: Option<String>,
    pub review_snippet: Option<String>,
}

impl PlaceCandidate {
    /// Convert to a [`Place`], or `None` when the candidate has no title
    pub fn into_place(self) -> Option<Place> {
        let name = self.title.filter(|t| !t.is_empty())?;
        let details = self
            .review_snippet
            .filter(|s| !s.is_empty())
            .or(self.uri)
            .unwrap_or_default()
            .chars()
            .take(PLACE_DETAILS_MAX_CHARS)
            .collect();
        Some(Place { name, details })
    }
}

/// Input for turning a photo into a sketch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SketchRequest {
    pub photo_base64: String,
    pub mime_type: String,
    pub transcription: String,
}

/// What the image model returned for a sketch request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageCandidate {
    /// Base64 image payload, if any part carried one
    pub image_data: Option<String>,
    pub finish_reason: Option<String>,
    /// Category of the first blocking safety rating
    pub blocked_category: Option<String>,
}
