//! User-entered track metadata and its normalized wire payload.
//!
//! Validation is purely local and runs before anything touches the
//! network. The duration check comes first, then required fields, then
//! timestamp normalization.

use std::sync::LazyLock;

use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Minutes (any number of ASCII digits) and exactly two seconds digits.
/// No surrounding whitespace.
static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+:[0-9]{2}$").expect("duration pattern is valid"));

/// Layouts accepted for local wall-clock input, most specific first.
/// `datetime-local` inputs produce the minute-precision form.
const LOCAL_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

pub const DEFAULT_PLATFORM: &str = "Spotify";

/// Form input for one prediction.
///
/// Accepts both the form's wire casing (`Track_Name`) and snake_case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackQuery {
    #[serde(alias = "Timestamp")]
    pub timestamp: String,
    #[serde(alias = "Artist")]
    pub artist: String,
    #[serde(alias = "Track_Name")]
    pub track_name: String,
    #[serde(alias = "Album")]
    pub album: String,
    #[serde(alias = "Platform", default)]
    pub platform: String,
    #[serde(alias = "Duration")]
    pub duration: String,
}

/// Normalized body shared by both prediction requests.
///
/// Field names and casing are the prediction service's contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionPayload {
    /// UTC ISO 8601 with milliseconds, e.g. `2024-03-01T13:30:00.000Z`.
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "Artist")]
    pub artist: String,
    #[serde(rename = "Track_Name")]
    pub track_name: String,
    #[serde(rename = "Album")]
    pub album: String,
    #[serde(rename = "Platform")]
    pub platform: String,
    /// Raw `M:SS` string, unconverted.
    #[serde(rename = "Duration")]
    pub duration: String,
}

/// Whether `duration` is `M:SS` / `MM:SS` (any number of minute digits).
pub fn is_valid_duration(duration: &str) -> bool {
    DURATION_RE.is_match(duration)
}

/// Convert a wall-clock timestamp in `tz` to a UTC ISO 8601 instant.
///
/// Inputs carrying their own offset (RFC 3339) ignore `tz`. A local time
/// that doesn't exist in `tz` (DST gap) is rejected; an ambiguous one
/// (DST overlap) resolves to the earlier instant.
pub fn normalize_timestamp_in<Tz: TimeZone>(
    raw: &str,
    tz: &Tz,
) -> Result<String, ValidationError> {
    let raw = raw.trim();
    let invalid = || ValidationError::Timestamp(raw.to_string());

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(to_iso_utc(&dt.with_timezone(&Utc)));
    }

    let naive = LOCAL_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .ok_or_else(invalid)?;

    let local = match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => return Err(invalid()),
    };

    Ok(to_iso_utc(&local.with_timezone(&Utc)))
}

fn to_iso_utc(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

impl TrackQuery {
    /// Check everything that can be checked without a network round trip.
    ///
    /// Duration is checked before any other field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_valid_duration(&self.duration) {
            return Err(ValidationError::Duration(self.duration.clone()));
        }

        let required = [
            ("Timestamp", &self.timestamp),
            ("Artist", &self.artist),
            ("Track_Name", &self.track_name),
            ("Album", &self.album),
        ];
        if let Some((name, _)) = required.into_iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ValidationError::MissingField(name));
        }

        Ok(())
    }

    /// Build the wire payload, resolving the timestamp in `tz`.
    pub fn normalize_in<Tz: TimeZone>(&self, tz: &Tz) -> Result<PredictionPayload, ValidationError> {
        let platform = self.platform.trim();
        Ok(PredictionPayload {
            timestamp: normalize_timestamp_in(&self.timestamp, tz)?,
            artist: self.artist.trim().to_string(),
            track_name: self.track_name.trim().to_string(),
            album: self.album.trim().to_string(),
            platform: if platform.is_empty() {
                DEFAULT_PLATFORM.to_string()
            } else {
                platform.to_string()
            },
            duration: self.duration.clone(),
        })
    }

    /// [`TrackQuery::normalize_in`] using the local time zone.
    pub fn normalize(&self) -> Result<PredictionPayload, ValidationError> {
        self.normalize_in(&Local)
    }

    /// Fill a blank platform with `default`.
    pub fn with_default_platform(mut self, default: &str) -> Self {
        if self.platform.trim().is_empty() {
            self.platform = default.to_string();
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, NaiveDate};

    use super::*;

    /// Central European time for 2024: UTC+2 from 31 Mar 01:00 UTC to
    /// 27 Oct 01:00 UTC, UTC+1 otherwise.
    #[derive(Debug, Clone, Copy)]
    struct Cet2024;

    const WINTER: i32 = 3600;
    const SUMMER: i32 = 7200;

    fn utc_at(month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    impl TimeZone for Cet2024 {
        type Offset = FixedOffset;

        fn from_offset(_: &FixedOffset) -> Self {
            Cet2024
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            // Earlier instant first: the larger offset maps to the earlier UTC time.
            let fits: Vec<FixedOffset> = [SUMMER, WINTER]
                .into_iter()
                .map(|secs| FixedOffset::east_opt(secs).unwrap())
                .filter(|off| {
                    let utc = *local - chrono::Duration::seconds(i64::from(off.local_minus_utc()));
                    self.offset_from_utc_datetime(&utc) == *off
                })
                .collect();
            match fits.as_slice() {
                [] => LocalResult::None,
                [only] => LocalResult::Single(*only),
                [earliest, latest, ..] => LocalResult::Ambiguous(*earliest, *latest),
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            let summer = *utc >= utc_at(3, 31, 1) && *utc < utc_at(10, 27, 1);
            FixedOffset::east_opt(if summer { SUMMER } else { WINTER }).unwrap()
        }
    }

    fn query() -> TrackQuery {
        TrackQuery {
            timestamp: "2024-03-01T14:30".to_string(),
            artist: "Radiohead".to_string(),
            track_name: "Reckoner".to_string(),
            album: "In Rainbows".to_string(),
            platform: String::new(),
            duration: "4:50".to_string(),
        }
    }

    #[test]
    fn duration_pattern() {
        assert!(is_valid_duration("3:30"));
        assert!(is_valid_duration("12:05"));
        assert!(is_valid_duration("120:00"));
        assert!(!is_valid_duration("3:3"));
        assert!(!is_valid_duration("3-30"));
        assert!(!is_valid_duration(""));
        assert!(!is_valid_duration("abc"));
        assert!(!is_valid_duration(":30"));
        assert!(!is_valid_duration("3:300"));
        assert!(!is_valid_duration(" 3:30 "));
        assert!(!is_valid_duration("３:３０"));
        assert!(!is_valid_duration("٣:٣٠"));
    }

    #[test]
    fn duration_is_checked_before_other_fields() {
        let mut q = query();
        q.duration = "3-30".to_string();
        q.artist = String::new();
        q.timestamp = "not a date".to_string();
        assert_eq!(
            q.validate(),
            Err(ValidationError::Duration("3-30".to_string()))
        );
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let mut q = query();
        q.album = "   ".to_string();
        assert_eq!(q.validate(), Err(ValidationError::MissingField("Album")));
    }

    #[test]
    fn local_time_is_converted_to_utc() {
        let cet = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            normalize_timestamp_in("2024-03-01T14:30", &cet).unwrap(),
            "2024-03-01T13:30:00.000Z"
        );
        assert_eq!(
            normalize_timestamp_in("2024-03-01 00:15:42", &Utc).unwrap(),
            "2024-03-01T00:15:42.000Z"
        );
    }

    #[test]
    fn local_time_in_dst_gap_is_rejected() {
        assert_eq!(
            normalize_timestamp_in("2024-03-31T02:30", &Cet2024),
            Err(ValidationError::Timestamp("2024-03-31T02:30".to_string()))
        );
        assert_eq!(
            normalize_timestamp_in("2024-03-31T03:30", &Cet2024).unwrap(),
            "2024-03-31T01:30:00.000Z"
        );
    }

    #[test]
    fn ambiguous_local_time_takes_the_earlier_instant() {
        assert_eq!(
            normalize_timestamp_in("2024-10-27T02:30", &Cet2024).unwrap(),
            "2024-10-27T00:30:00.000Z"
        );
        assert_eq!(
            normalize_timestamp_in("2024-10-27T03:30", &Cet2024).unwrap(),
            "2024-10-27T02:30:00.000Z"
        );
    }

    #[test]
    fn gap_timestamp_fails_validation_before_dispatch() {
        let mut q = query();
        q.timestamp = "2024-03-31 02:15".to_string();
        assert!(q.validate().is_ok());
        assert_eq!(
            q.normalize_in(&Cet2024),
            Err(ValidationError::Timestamp("2024-03-31 02:15".to_string()))
        );
    }

    #[test]
    fn offset_timestamps_ignore_zone() {
        let far = FixedOffset::west_opt(8 * 3600).unwrap();
        assert_eq!(
            normalize_timestamp_in("2024-03-01T14:30:00+02:00", &far).unwrap(),
            "2024-03-01T12:30:00.000Z"
        );
    }

    #[test]
    fn unparseable_timestamp_is_a_validation_error() {
        assert_eq!(
            normalize_timestamp_in("yesterday", &Utc),
            Err(ValidationError::Timestamp("yesterday".to_string()))
        );
    }

    #[test]
    fn payload_uses_wire_casing_and_default_platform() {
        let payload = query().normalize_in(&Utc).unwrap();
        assert_eq!(payload.platform, "Spotify");
        assert_eq!(payload.duration, "4:50");

        let json = serde_json::to_value(&payload).unwrap();
        let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec!["Album", "Artist", "Duration", "Platform", "Timestamp", "Track_Name"]
        );
        assert_eq!(json["Timestamp"], "2024-03-01T14:30:00.000Z");
    }

    #[test]
    fn query_accepts_form_casing() {
        let json = r#"{
            "Timestamp": "2024-03-01T14:30",
            "Artist": "Radiohead",
            "Track_Name": "Reckoner",
            "Album": "In Rainbows",
            "Duration": "4:50"
        }"#;
        let q: TrackQuery = serde_json::from_str(json).unwrap();
        assert_eq!(q.track_name, "Reckoner");
        assert!(q.platform.is_empty());
        assert_eq!(q.with_default_platform("Web").platform, "Web");
    }
}
