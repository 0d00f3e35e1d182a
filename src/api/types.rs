//! Wire types for the statistics backend.
//!
//! Field names follow the backend's JSON exactly (including the
//! space-separated `"Track Name"` column and the capitalised aggregate
//! columns); Rust-side names are snake_case.

use serde::{Deserialize, Serialize};

/// Row of `GET /api/basic/total-plays`.
#[derive(Debug, Clone, Deserialize)]
pub struct TotalPlaysRow {
    pub total_plays: u64,
}

/// Row of `GET /api/basic/most-played-tracks`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPlays {
    #[serde(rename = "Track Name")]
    pub track_name: String,
    #[serde(rename = "Artist")]
    pub artist: String,
    pub play_count: u64,
}

/// Row of `GET /api/basic/artist-playtime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistPlaytime {
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "Total_Plays")]
    pub total_plays: u64,
    #[serde(rename = "Total_Hours_Played")]
    pub total_hours_played: f64,
}

/// Envelope of `GET /api/intermediate/skip-analysis`.
#[derive(Debug, Clone, Deserialize)]
pub struct SkipAnalysisResponse {
    #[serde(default)]
    pub count: Option<usize>,
    pub data: Vec<SkipRow>,
}

/// One of the most-skipped tracks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkipRow {
    #[serde(rename = "Artist")]
    pub artist: String,
    pub track_name: String,
    pub total_plays: u64,
    pub skips: u64,
    /// Percentage, one decimal (e.g. `42.5`).
    pub skip_rate: f64,
}

/// Body of `POST /api/ml/predict-skip`.
#[derive(Debug, Clone, Deserialize)]
pub struct SkipPrediction {
    pub probability: f64,
}

/// Body of `POST /api/ml/predict-session-duration`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionDurationPrediction {
    pub duration_minutes: f64,
}

/// Error body returned by the backend on 4xx/5xx.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub missing: Vec<String>,
}

impl ErrorBody {
    /// Human-readable message, listing missing fields when present.
    pub fn message(&self) -> String {
        if self.missing.is_empty() {
            self.error.clone()
        } else {
            format!("{}: {}", self.error, self.missing.join(", "))
        }
    }
}
