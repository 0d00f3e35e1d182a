//! Read-only display fetches.
//!
//! None of these fail: a backend error is logged and the view degrades to
//! its empty state (zero plays, no rows, an all-zero activity matrix).

use serde::Serialize;

use crate::activity::{self, ActivityMatrix};
use crate::api::types::{ArtistPlaytime, SkipRow, TotalPlaysRow, TrackPlays};
use crate::api::{BackendClient, RequestError};
use crate::diagnostics::{Diagnostics, LogLevel};

const SOURCE: &str = "overview";

/// Basic and artist stats shown at the top of the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub total_plays: u64,
    pub top_tracks: Vec<TrackPlays>,
    pub artists: Vec<ArtistPlaytime>,
}

/// Most-skipped tracks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SkipTable {
    pub count: usize,
    pub rows: Vec<SkipRow>,
}

/// Built activity matrix plus how many raw rows never made it in.
#[derive(Debug, Clone, Default)]
pub struct ActivityReport {
    pub matrix: ActivityMatrix,
    pub undecodable: usize,
    pub out_of_range: usize,
    pub duplicates: usize,
}

impl ActivityReport {
    /// Build from the raw backend rows.
    pub fn from_rows(rows: &[serde_json::Value]) -> Self {
        let (samples, undecodable) = activity::decode_samples(rows);
        let (matrix, stats) = activity::build_with_stats(&samples);
        Self {
            matrix,
            undecodable,
            out_of_range: stats.out_of_range,
            duplicates: stats.duplicates,
        }
    }

    /// Rows that never reached a cell: undecodable or out of range.
    pub fn dropped(&self) -> usize {
        self.undecodable + self.out_of_range
    }
}

/// The single aggregate row of `total-plays`. An empty list is a shape error.
pub fn first_total(rows: &[TotalPlaysRow]) -> Result<u64, RequestError> {
    rows.first()
        .map(|row| row.total_plays)
        .ok_or_else(|| RequestError::DataShape("total-plays returned no rows".to_string()))
}

pub fn load_overview(client: &BackendClient, diagnostics: &Diagnostics) -> Overview {
    let total_plays = or_empty(
        diagnostics,
        "total plays",
        client.total_plays().and_then(|rows| first_total(&rows)),
    );
    let top_tracks = or_empty(diagnostics, "most played tracks", client.most_played_tracks());
    let artists = or_empty(diagnostics, "artist playtime", client.artist_playtime());

    Overview {
        total_plays,
        top_tracks,
        artists,
    }
}

pub fn load_skips(client: &BackendClient, diagnostics: &Diagnostics) -> SkipTable {
    let resp = or_empty(
        diagnostics,
        "skip analysis",
        client.skip_analysis().map(Some),
    );
    match resp {
        Some(resp) => SkipTable {
            count: resp.count.unwrap_or(resp.data.len()),
            rows: resp.data,
        },
        None => SkipTable::default(),
    }
}

pub fn load_activity(client: &BackendClient, diagnostics: &Diagnostics) -> ActivityReport {
    let rows = or_empty(diagnostics, "listening activity", client.activity_rows());
    let report = ActivityReport::from_rows(&rows);

    if report.dropped() > 0 {
        diagnostics.record(
            LogLevel::Warn,
            SOURCE,
            &format!("dropped {} malformed activity rows", report.dropped()),
            Some(serde_json::json!({
                "undecodable": report.undecodable,
                "out_of_range": report.out_of_range,
            })),
        );
    }
    if report.duplicates > 0 {
        diagnostics.info(
            SOURCE,
            &format!(
                "ignored {} duplicate activity rows (first occurrence kept)",
                report.duplicates
            ),
        );
    }

    report
}

/// Unwrap a display fetch, logging and defaulting on error.
fn or_empty<T: Default>(diagnostics: &Diagnostics, what: &str, result: Result<T, RequestError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            diagnostics.record(
                LogLevel::Warn,
                SOURCE,
                &format!("failed to load {what}: {err}"),
                Some(serde_json::json!({ "kind": err.kind() })),
            );
            T::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::Weekday;
    use serde_json::json;

    use super::*;

    #[test]
    fn empty_total_plays_is_a_shape_error() {
        assert_eq!(
            first_total(&[]).unwrap_err().kind(),
            "data_shape"
        );
        assert_eq!(first_total(&[TotalPlaysRow { total_plays: 1234 }]), Ok(1234));
    }

    #[test]
    fn report_counts_every_kind_of_reject() {
        let rows = vec![
            json!({"day_of_week": 0, "hour": 9, "plays": 4}),
            json!({"day_of_week": 0, "hour": 9, "plays": 99}),
            json!({"day_of_week": 7, "hour": 9, "plays": 1}),
            json!({"day_of_week": "x"}),
        ];
        let report = ActivityReport::from_rows(&rows);
        assert_eq!(report.matrix.get(Weekday::Mon, 9), 4);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.out_of_range, 1);
        assert_eq!(report.undecodable, 1);
        assert_eq!(report.dropped(), 2);
        assert_eq!(report.matrix.dropped(), report.out_of_range);
    }

    #[test]
    fn unreachable_backend_degrades_to_empty() {
        let client = BackendClient::new("http://127.0.0.1:9", Duration::from_millis(300));
        let diag = Diagnostics::disabled();

        assert_eq!(load_overview(&client, &diag), Overview::default());
        assert_eq!(load_skips(&client, &diag), SkipTable::default());
        assert_eq!(load_activity(&client, &diag).matrix.total(), 0);
    }
}
