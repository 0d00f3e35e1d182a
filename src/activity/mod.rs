//! Listening activity matrix.
//!
//! The backend reports play counts per `(day_of_week, hour)` pair only for
//! pairs that had at least one play. [`build`] densifies that sparse list
//! into a total 7 × 24 [`ActivityMatrix`] so the stacked time-of-day chart
//! always has one value per day for every hour series.
//!
//! # Day-of-week convention
//!
//! `day_of_week` is Monday-based: `0 = Mon … 6 = Sun`. The backend derives
//! it from SQLite's Sunday-based `%w` and shifts it by one before
//! responding. A mismatch here silently rotates the chart by a day.

use std::collections::HashMap;

use chrono::Weekday;
use serde::{Deserialize, Deserializer, Serialize};

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: usize = 24;

/// Fixed chart order; index is the wire `day_of_week`.
pub const DAY_ORDER: [Weekday; DAYS_PER_WEEK] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// ---------------------------------------------------------------------------
// Samples
// ---------------------------------------------------------------------------

/// One sparse observation from `/api/visualization/activity-stackedbarchart`.
///
/// Fields are kept signed and unchecked so out-of-range rows survive
/// decoding and can be dropped by [`build`] instead of failing the whole
/// response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivitySample {
    #[serde(deserialize_with = "lenient_int")]
    pub day_of_week: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub hour: i64,
    #[serde(deserialize_with = "lenient_int")]
    pub plays: i64,
}

impl ActivitySample {
    pub fn new(day_of_week: i64, hour: i64, plays: i64) -> Self {
        Self {
            day_of_week,
            hour,
            plays,
        }
    }

    /// Matrix coordinates, or `None` when the sample is out of range.
    fn cell(&self) -> Option<(usize, usize)> {
        let day = usize::try_from(self.day_of_week).ok()?;
        let hour = usize::try_from(self.hour).ok()?;
        (day < DAYS_PER_WEEK && hour < HOURS_PER_DAY).then_some((day, hour))
    }

    fn plays(&self) -> Option<u64> {
        u64::try_from(self.plays).ok()
    }
}

/// Accept integers encoded as JSON numbers or numeric strings.
///
/// SQLite's `strftime` yields text (`"07"`), so the hour column arrives as a
/// string unless the backend casts it.
fn lenient_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Int(i64),
        Float(f64),
        Text(String),
    }

    match NumOrText::deserialize(deserializer)? {
        NumOrText::Int(n) => Ok(n),
        NumOrText::Float(f) if f.fract() == 0.0 && f.is_finite() => Ok(f as i64),
        NumOrText::Float(f) => Err(serde::de::Error::custom(format!(
            "expected an integer, got {f}"
        ))),
        NumOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("expected an integer, got '{s}'"))),
    }
}

/// Decode a raw JSON array into samples, skipping rows that don't decode.
///
/// Returns the decoded samples and the number of rows skipped.
pub fn decode_samples(raw: &[serde_json::Value]) -> (Vec<ActivitySample>, usize) {
    let samples: Vec<ActivitySample> = raw
        .iter()
        .filter_map(|v| ActivitySample::deserialize(v).ok())
        .collect();
    let skipped = raw.len() - samples.len();
    (samples, skipped)
}

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// Dense day × hour play counts, days in [`DAY_ORDER`], hours `0..24`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityMatrix {
    cells: [[u64; HOURS_PER_DAY]; DAYS_PER_WEEK],
    dropped: usize,
}

/// Outcome of densification, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Samples rejected for out-of-range day, hour or plays.
    pub out_of_range: usize,
    /// Samples ignored because an earlier sample had the same `(day, hour)`.
    pub duplicates: usize,
}

/// Densify a sparse sample list into a full 7 × 24 matrix.
///
/// Out-of-range samples are dropped; for duplicate `(day, hour)` pairs the
/// first sample wins. Empty input yields an all-zero matrix.
pub fn build(samples: &[ActivitySample]) -> ActivityMatrix {
    build_with_stats(samples).0
}

/// [`build`], also reporting what was dropped.
pub fn build_with_stats(samples: &[ActivitySample]) -> (ActivityMatrix, BuildStats) {
    let mut stats = BuildStats::default();
    let mut lookup: HashMap<(usize, usize), u64> = HashMap::with_capacity(samples.len());

    for sample in samples {
        let (Some(cell), Some(plays)) = (sample.cell(), sample.plays()) else {
            stats.out_of_range += 1;
            continue;
        };
        if lookup.contains_key(&cell) {
            stats.duplicates += 1;
            continue;
        }
        lookup.insert(cell, plays);
    }

    let mut cells = [[0u64; HOURS_PER_DAY]; DAYS_PER_WEEK];
    for (day, row) in cells.iter_mut().enumerate() {
        for (hour, slot) in row.iter_mut().enumerate() {
            *slot = lookup.get(&(day, hour)).copied().unwrap_or(0);
        }
    }

    let matrix = ActivityMatrix {
        cells,
        dropped: stats.out_of_range,
    };
    (matrix, stats)
}

/// One stack layer of the chart: a single hour across all seven days.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourSeries {
    pub hour: u8,
    pub label: String,
    #[serde(rename = "backgroundColor")]
    pub color: String,
    pub data: [u64; DAYS_PER_WEEK],
}

/// Stacked bar chart payload: day labels plus one dataset per hour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<HourSeries>,
}

/// Busiest cell of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Peak {
    pub day: Weekday,
    pub hour: u8,
    pub plays: u64,
}

impl ActivityMatrix {
    pub fn zeroed() -> Self {
        Self {
            cells: [[0; HOURS_PER_DAY]; DAYS_PER_WEEK],
            dropped: 0,
        }
    }

    /// Play count for `day` at `hour`; hours past 23 read as zero.
    pub fn get(&self, day: Weekday, hour: u8) -> u64 {
        let day = day.num_days_from_monday() as usize;
        self.cells[day]
            .get(usize::from(hour))
            .copied()
            .unwrap_or(0)
    }

    /// Rows in [`DAY_ORDER`], each with 24 hourly counts.
    pub fn rows(&self) -> impl Iterator<Item = (Weekday, &[u64; HOURS_PER_DAY])> {
        DAY_ORDER.iter().copied().zip(self.cells.iter())
    }

    /// Out-of-range samples that did not make it into the matrix.
    /// Duplicates are not counted: their cell is filled by the first one.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// 24 series ordered by hour, each spanning Mon..Sun.
    ///
    /// Colours are a pure function of the hour so legend and stack colours
    /// stay put across renders.
    pub fn hour_series(&self) -> Vec<HourSeries> {
        (0..HOURS_PER_DAY)
            .map(|hour| {
                let mut data = [0u64; DAYS_PER_WEEK];
                for (day, slot) in data.iter_mut().enumerate() {
                    *slot = self.cells[day][hour];
                }
                HourSeries {
                    hour: hour as u8,
                    label: format!("{hour}:00"),
                    color: hour_color(hour as u8),
                    data,
                }
            })
            .collect()
    }

    pub fn chart_data(&self) -> ChartData {
        ChartData {
            labels: DAY_ORDER.iter().map(|d| d.to_string()).collect(),
            datasets: self.hour_series(),
        }
    }

    pub fn day_totals(&self) -> [u64; DAYS_PER_WEEK] {
        let mut totals = [0u64; DAYS_PER_WEEK];
        for (total, row) in totals.iter_mut().zip(self.cells.iter()) {
            *total = row.iter().sum();
        }
        totals
    }

    pub fn hour_totals(&self) -> [u64; HOURS_PER_DAY] {
        let mut totals = [0u64; HOURS_PER_DAY];
        for row in &self.cells {
            for (total, plays) in totals.iter_mut().zip(row.iter()) {
                *total += plays;
            }
        }
        totals
    }

    pub fn total(&self) -> u64 {
        self.cells.iter().flatten().sum()
    }

    pub fn max_cell(&self) -> u64 {
        self.cells.iter().flatten().copied().max().unwrap_or(0)
    }

    /// Busiest `(day, hour)`; earliest in chart order on ties. `None` when empty.
    pub fn peak(&self) -> Option<Peak> {
        let mut best: Option<Peak> = None;
        for (day, row) in self.rows() {
            for (hour, &plays) in row.iter().enumerate() {
                if plays > 0 && best.is_none_or(|b| plays > b.plays) {
                    best = Some(Peak {
                        day,
                        hour: hour as u8,
                        plays,
                    });
                }
            }
        }
        best
    }
}

impl Default for ActivityMatrix {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Chart colour for an hour series: hue evenly spread over the day.
pub fn hour_color(hour: u8) -> String {
    let hue = f64::from(hour) / HOURS_PER_DAY as f64 * 360.0;
    format!("hsl({hue}, 70%, 50%)")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
