//! JSON API handlers for the web dashboard.
//!
//! Each handler returns a [`Reply`]: a status code plus a JSON body. The
//! router turns it into a `tiny_http` response.

use std::io::Cursor;

use anyhow::{Context, Result};
use serde::Serialize;
use tiny_http::{Response, StatusCode};

use crate::config;
use crate::overview::{self, Overview, SkipTable};
use crate::predict::{Displayed, Phase, PredictionError, PredictionView, Settlement, TrackQuery};

use super::{AppState, content_type_json};

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// Status code and JSON body of an API response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: serde_json::Value,
}

impl Reply {
    fn ok<T: Serialize>(data: &T) -> Result<Self> {
        Self::with_status(200, data)
    }

    fn with_status<T: Serialize>(status: u16, data: &T) -> Result<Self> {
        let body = serde_json::to_value(data).context("failed to serialize JSON response")?;
        Ok(Self { status, body })
    }

    /// `{ "error": message }` with the given status.
    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            body: serde_json::json!({ "error": message }),
        }
    }

    pub fn into_response(self) -> Response<Cursor<Vec<u8>>> {
        Response::from_data(self.body.to_string().into_bytes())
            .with_header(content_type_json())
            .with_status_code(StatusCode(self.status))
    }
}

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ActivityResponse {
    labels: Vec<String>,
    datasets: Vec<crate::activity::HourSeries>,
    day_totals: [u64; crate::activity::DAYS_PER_WEEK],
    hour_totals: [u64; crate::activity::HOURS_PER_DAY],
    total: u64,
    max_day_total: u64,
    dropped: usize,
}

/// Outcome of one `POST /api/predict`.
#[derive(Serialize)]
struct PredictResponse {
    token: u64,
    /// `false` when a newer submission settled first and this result was
    /// not put on display.
    displayed: bool,
    result: PredictionView,
}

#[derive(Serialize)]
struct LatestResponse {
    phase: Phase,
    busy: bool,
    latest: Option<DisplayedResponse>,
}

#[derive(Serialize)]
struct DisplayedResponse {
    token: u64,
    resolved_at: String,
    payload: Option<crate::predict::PredictionPayload>,
    result: PredictionView,
}

impl From<Displayed> for DisplayedResponse {
    fn from(d: Displayed) -> Self {
        Self {
            token: d.token,
            resolved_at: d.resolved_at.to_rfc3339(),
            result: d.resolution.view(),
            payload: d.payload,
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    backend_url: String,
    backend_reachable: bool,
    config_exists: bool,
    log_path: Option<String>,
    log_exists: bool,
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `GET /api/overview`: total plays, top tracks, artist playtime.
pub fn get_overview(state: &AppState) -> Result<Reply> {
    let stats: Overview = overview::load_overview(&state.client, &state.diagnostics);
    Reply::ok(&stats)
}

/// `GET /api/activity`: stacked bar chart data from the densified matrix.
pub fn get_activity(state: &AppState) -> Result<Reply> {
    let report = overview::load_activity(&state.client, &state.diagnostics);
    let matrix = &report.matrix;
    let chart = matrix.chart_data();
    let day_totals = matrix.day_totals();

    let resp = ActivityResponse {
        labels: chart.labels,
        datasets: chart.datasets,
        day_totals,
        hour_totals: matrix.hour_totals(),
        total: matrix.total(),
        max_day_total: day_totals.iter().copied().max().unwrap_or(0),
        dropped: report.dropped(),
    };
    Reply::ok(&resp)
}

/// `GET /api/skips`: most-skipped tracks.
pub fn get_skips(state: &AppState) -> Result<Reply> {
    let table: SkipTable = overview::load_skips(&state.client, &state.diagnostics);
    Reply::ok(&table)
}

/// `POST /api/predict`: run one prediction cycle.
///
/// Expects the form fields as JSON:
/// `{ "Timestamp", "Artist", "Track_Name", "Album", "Platform"?, "Duration" }`.
/// Responds 422 when validation fails, 502 when both requests fail.
pub fn post_predict(state: &AppState, body: &str) -> Result<Reply> {
    let query: TrackQuery = match serde_json::from_str(body) {
        Ok(q) => q,
        Err(e) => return Ok(Reply::error(400, &format!("invalid prediction request: {e}"))),
    };
    let query = query.with_default_platform(&state.config.predict.default_platform);

    let settled = state.orchestrator.submit(&query);
    let status = match settled.resolution().error() {
        Some(PredictionError::Validation(_)) => 422,
        Some(PredictionError::AllRequestsFailed { .. }) => 502,
        None => 200,
    };

    let resp = match settled {
        Settlement::Displayed(d) => PredictResponse {
            token: d.token,
            displayed: true,
            result: d.resolution.view(),
        },
        Settlement::Discarded { token, resolution } => PredictResponse {
            token,
            displayed: false,
            result: resolution.view(),
        },
    };
    Reply::with_status(status, &resp)
}

/// `GET /api/predict/latest`: the prediction currently on display.
pub fn get_predict_latest(state: &AppState) -> Result<Reply> {
    let phase = state.orchestrator.phase();
    let resp = LatestResponse {
        phase,
        busy: phase.is_busy(),
        latest: state.orchestrator.latest().map(DisplayedResponse::from),
    };
    Reply::ok(&resp)
}

/// `GET /api/health`: backend reachability and local files.
pub fn get_health(state: &AppState) -> Result<Reply> {
    let config_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let log_path = state.diagnostics.path();

    let resp = HealthResponse {
        backend_url: state.client.base_url().to_string(),
        backend_reachable: state.client.is_healthy(),
        config_exists,
        log_path: log_path.map(|p| p.display().to_string()),
        log_exists: log_path.is_some_and(|p| p.exists()),
    };
    Reply::ok(&resp)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TunedashConfig;
    use crate::diagnostics::Diagnostics;

    /// State pointed at a closed port, so every backend call fails fast.
    fn offline_state() -> AppState {
        let mut cfg = TunedashConfig::default();
        cfg.backend.base_url = "http://127.0.0.1:9".to_string();
        cfg.backend.timeout_ms = 300;
        AppState::new(cfg, Diagnostics::disabled())
    }

    #[test]
    fn overview_degrades_when_backend_is_down() {
        let reply = get_overview(&offline_state()).unwrap();
        assert_eq!(reply.status, 200);
        assert_eq!(reply.body["total_plays"], 0);
        assert_eq!(reply.body["top_tracks"], serde_json::json!([]));
    }

    #[test]
    fn activity_is_all_zero_when_backend_is_down() {
        let reply = get_activity(&offline_state()).unwrap();
        assert_eq!(reply.body["total"], 0);
        assert_eq!(reply.body["labels"].as_array().unwrap().len(), 7);
        assert_eq!(reply.body["datasets"].as_array().unwrap().len(), 24);
    }

    #[test]
    fn malformed_body_is_400() {
        let reply = post_predict(&offline_state(), "{not json").unwrap();
        assert_eq!(reply.status, 400);
        assert!(reply.body["error"].as_str().unwrap().contains("invalid"));
    }

    #[test]
    fn bad_duration_is_422_and_displayed() {
        let state = offline_state();
        let body = r#"{
            "Timestamp": "2024-03-01T14:30",
            "Artist": "Radiohead",
            "Track_Name": "Reckoner",
            "Album": "In Rainbows",
            "Duration": "4-50"
        }"#;
        let reply = post_predict(&state, body).unwrap();
        assert_eq!(reply.status, 422);
        assert_eq!(reply.body["displayed"], true);
        assert_eq!(reply.body["result"]["status"], "failure");
        assert_eq!(reply.body["result"]["error"]["kind"], "validation");

        let latest = get_predict_latest(&state).unwrap();
        assert_eq!(latest.body["phase"], "resolved");
        assert_eq!(latest.body["busy"], false);
        assert_eq!(latest.body["latest"]["token"], 1);
    }

    #[test]
    fn both_requests_failing_is_502() {
        let body = r#"{
            "Timestamp": "2024-03-01T14:30:00Z",
            "Artist": "Radiohead",
            "Track_Name": "Reckoner",
            "Album": "In Rainbows",
            "Duration": "4:50"
        }"#;
        let reply = post_predict(&offline_state(), body).unwrap();
        assert_eq!(reply.status, 502);
        assert_eq!(reply.body["result"]["error"]["kind"], "transport");
    }

    #[test]
    fn latest_is_empty_before_any_submission() {
        let reply = get_predict_latest(&offline_state()).unwrap();
        assert_eq!(reply.body["phase"], "idle");
        assert!(reply.body["latest"].is_null());
    }

    #[test]
    fn error_reply_shape() {
        let reply = Reply::error(404, "not found");
        assert_eq!(reply.status, 404);
        assert_eq!(reply.body, serde_json::json!({ "error": "not found" }));
    }
}
