//! Diary use cases routed through the governor

use std::sync::Arc;

use tracing::debug;

use crate::config::Config;
use crate::governor::{Governor, Ticket};
use crate::remote::{DaySummary, DiaryEntry, GenerativeClient, ImageCandidate, Place, PlaceCandidate, RemoteError, SketchRequest};

/// Entry point for every remote call the diary makes
///
/// Each method returns immediately; the ticket settles once the governor has
/// dispatched the call and any retries have finished.
#[derive(Clone)]
pub struct DiaryService {
    governor: Governor,
    client: Arc<dyn GenerativeClient>,
}

impl DiaryService {
    pub fn new(governor: Governor, client: Arc<dyn GenerativeClient>) -> Self {
        Self { governor, client }
    }

    /// Build a governor from `config`, guarded by the credential check
    pub fn from_config(config: &Config, client: Arc<dyn GenerativeClient>) -> Self {
        let governor = Governor::new(&config.governor).with_precondition(config.credentials.precondition());
        Self::new(governor, client)
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    /// Find places matching `query`, one per name
    pub fn search_places(&self, query: impl Into<String>) -> Ticket<Vec<Place>> {
        let query = query.into();
        debug!(%query, "DiaryService::search_places: called");
        let client = Arc::clone(&self.client);
        self.governor.submit(move || {
            let client = Arc::clone(&client);
            let query = query.clone();
            async move {
                let candidates = client.search_places(&query).await?;
                Ok(dedupe_places(candidates))
            }
        })
    }

    /// Write diary text for a transcription, optionally set at a place
    pub fn generate_entry(&self, transcription: impl Into<String>, place_name: Option<String>) -> Ticket<String> {
        let transcription = transcription.into();
        debug!(len = transcription.len(), ?place_name, "DiaryService::generate_entry: called");
        let client = Arc::clone(&self.client);
        self.governor.submit(move || {
            let client = Arc::clone(&client);
            let transcription = transcription.clone();
            let place_name = place_name.clone();
            async move { client.write_entry(&transcription, place_name.as_deref()).await }
        })
    }

    /// Redraw a photo as a sketch; resolves to base64 image data
    pub fn generate_sketch(&self, request: SketchRequest) -> Ticket<String> {
        debug!(mime_type = %request.mime_type, "DiaryService::generate_sketch: called");
        let client = Arc::clone(&self.client);
        self.governor.submit(move || {
            let client = Arc::clone(&client);
            let request = request.clone();
            async move {
                let candidate = client.draw_sketch(&request).await?;
                image_data(candidate)
            }
        })
    }

    /// Summarize a day of entries with an emotion score
    pub fn summarize_day(&self, entries: Vec<DiaryEntry>) -> Ticket<DaySummary> {
        debug!(count = entries.len(), "DiaryService::summarize_day: called");
        let client = Arc::clone(&self.client);
        let entries = Arc::new(entries);
        self.governor.submit(move || {
            let client = Arc::clone(&client);
            let entries = Arc::clone(&entries);
            async move {
                let raw = client.summarize(&entries).await?;
                parse_summary(&raw)
            }
        })
    }
}

/// Keep titled candidates, one per name, in first-seen order with the last-seen details
fn dedupe_places(candidates: Vec<PlaceCandidate>) -> Vec<Place> {
    let mut places: Vec<Place> = Vec::new();
    for place in candidates.into_iter().filter_map(PlaceCandidate::into_place) {
        match places.iter_mut().find(|p| p.name == place.name) {
            Some(existing) => *existing = place,
            None => places.push(place),
        }
    }
    places
}

fn image_data(candidate: ImageCandidate) -> Result<String, RemoteError> {
    if let Some(data) = candidate.image_data.filter(|d| !d.is_empty()) {
        return Ok(data);
    }

    match candidate.finish_reason.as_deref() {
        Some("SAFETY") => {
            let category = candidate.blocked_category.as_deref().unwrap_or("Unknown");
            debug!(%category, "image_data: blocked by safety filter");
            Err(RemoteError::fatal(format!(
                "Image generation was blocked for safety reasons (category: {}). Adjust the prompt or image and try again.",
                category
            )))
        }
        Some(reason) => Err(RemoteError::fatal(format!("Image generation failed (reason: {})", reason))),
        None => Err(RemoteError::InvalidResponse(
            "image generation returned no image data".to_string(),
        )),
    }
}

fn parse_summary(raw: &str) -> Result<DaySummary, RemoteError> {
    serde_json::from_str(raw.trim()).map_err(|e| RemoteError::InvalidResponse(format!("summary is not valid JSON: {}", e)))
}
