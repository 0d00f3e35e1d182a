/// Blocking client for the statistics backend.
///
/// Uses a shared `ureq::Agent` (connection reuse, one timeout for every
/// request). Endpoints consumed:
///
/// | Method | Path                                          |
/// |--------|-----------------------------------------------|
/// | GET    | `/api/basic/total-plays`                      |
/// | GET    | `/api/basic/most-played-tracks`               |
/// | GET    | `/api/basic/artist-playtime`                  |
/// | GET    | `/api/visualization/activity-stackedbarchart` |
/// | GET    | `/api/intermediate/skip-analysis`             |
/// | POST   | `/api/ml/predict-skip`                        |
/// | POST   | `/api/ml/predict-session-duration`            |
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::RequestError;
use super::types::{
    ArtistPlaytime, SessionDurationPrediction, SkipAnalysisResponse, SkipPrediction,
    TotalPlaysRow, TrackPlays,
};
use crate::config::schema::BackendConfig;
use crate::predict::{PredictionPayload, PredictionService};

pub const TOTAL_PLAYS_PATH: &str = "/api/basic/total-plays";
pub const MOST_PLAYED_PATH: &str = "/api/basic/most-played-tracks";
pub const ARTIST_PLAYTIME_PATH: &str = "/api/basic/artist-playtime";
pub const ACTIVITY_PATH: &str = "/api/visualization/activity-stackedbarchart";
pub const SKIP_ANALYSIS_PATH: &str = "/api/intermediate/skip-analysis";
pub const PREDICT_SKIP_PATH: &str = "/api/ml/predict-skip";
pub const PREDICT_DURATION_PATH: &str = "/api/ml/predict-session-duration";

/// Timeout for the reachability probe, independent of the request timeout.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone)]
pub struct BackendClient {
    agent: ureq::Agent,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // "localhost" may resolve to ::1 first while the backend only binds
        // IPv4, which stalls every request until the IPv6 attempt times out.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, base_url }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(&config.base_url, Duration::from_millis(config.timeout_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RequestError> {
        let resp = self.agent.get(&self.url(path)).call()?;
        resp.into_json()
            .map_err(|e| RequestError::DataShape(format!("GET {path}: {e}")))
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        let resp = self.agent.post(&self.url(path)).send_json(body)?;
        resp.into_json()
            .map_err(|e| RequestError::DataShape(format!("POST {path}: {e}")))
    }

    // -- read-only display endpoints ---------------------------------------

    pub fn total_plays(&self) -> Result<Vec<TotalPlaysRow>, RequestError> {
        self.get_json(TOTAL_PLAYS_PATH)
    }

    pub fn most_played_tracks(&self) -> Result<Vec<TrackPlays>, RequestError> {
        self.get_json(MOST_PLAYED_PATH)
    }

    pub fn artist_playtime(&self) -> Result<Vec<ArtistPlaytime>, RequestError> {
        self.get_json(ARTIST_PLAYTIME_PATH)
    }

    /// Raw activity rows. Decoded row-by-row by
    /// [`crate::activity::decode_samples`] so one bad row doesn't sink the
    /// whole chart.
    pub fn activity_rows(&self) -> Result<Vec<serde_json::Value>, RequestError> {
        self.get_json(ACTIVITY_PATH)
    }

    pub fn skip_analysis(&self) -> Result<SkipAnalysisResponse, RequestError> {
        self.get_json(SKIP_ANALYSIS_PATH)
    }

    /// Whether the backend answers at all, using a short timeout.
    pub fn is_healthy(&self) -> bool {
        self.agent
            .get(&self.url(TOTAL_PLAYS_PATH))
            .timeout(HEALTH_TIMEOUT)
            .call()
            .is_ok()
    }
}

impl PredictionService for BackendClient {
    fn predict_skip(&self, payload: &PredictionPayload) -> Result<f64, RequestError> {
        let resp: SkipPrediction = self.post_json(PREDICT_SKIP_PATH, payload)?;
        Ok(resp.probability)
    }

    fn predict_session_duration(&self, payload: &PredictionPayload) -> Result<f64, RequestError> {
        let resp: SessionDurationPrediction = self.post_json(PREDICT_DURATION_PATH, payload)?;
        Ok(resp.duration_minutes)
    }
}
