/// Activity matrix tests.
///
/// Exercises densification through the public API: shape, zero-fill,
/// duplicate and out-of-range handling, and the chart payload built on top.
use chrono::Weekday;
use serde_json::json;
use tunedash::activity::{
    self, ActivitySample, DAY_ORDER, DAYS_PER_WEEK, HOURS_PER_DAY, decode_samples,
};

fn sample(day: i64, hour: i64, plays: i64) -> ActivitySample {
    ActivitySample::new(day, hour, plays)
}

fn cell_count(matrix: &activity::ActivityMatrix) -> usize {
    matrix.rows().map(|(_, row)| row.len()).sum()
}

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

#[test]
fn matrix_always_has_168_cells() {
    let inputs = [
        vec![],
        vec![sample(0, 0, 1)],
        vec![sample(6, 23, 9), sample(3, 12, 4), sample(9, 99, 1)],
    ];
    for samples in inputs {
        let matrix = activity::build(&samples);
        assert_eq!(cell_count(&matrix), DAYS_PER_WEEK * HOURS_PER_DAY);
    }
}

#[test]
fn empty_input_is_all_zero() {
    let matrix = activity::build(&[]);
    assert_eq!(matrix.total(), 0);
    assert!(matrix.rows().all(|(_, row)| row.iter().all(|&p| p == 0)));
    assert!(matrix.peak().is_none());
}

#[test]
fn rows_follow_monday_first_order() {
    let matrix = activity::build(&[]);
    let days: Vec<Weekday> = matrix.rows().map(|(d, _)| d).collect();
    assert_eq!(days, DAY_ORDER.to_vec());
    assert_eq!(days[0], Weekday::Mon);
    assert_eq!(days[6], Weekday::Sun);
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

#[test]
fn absent_pairs_are_zero_and_present_pairs_keep_their_plays() {
    let matrix = activity::build(&[sample(0, 9, 12), sample(4, 22, 3)]);
    assert_eq!(matrix.get(Weekday::Mon, 9), 12);
    assert_eq!(matrix.get(Weekday::Fri, 22), 3);
    assert_eq!(matrix.get(Weekday::Mon, 10), 0);
    assert_eq!(matrix.get(Weekday::Sun, 9), 0);
    assert_eq!(matrix.total(), 15);
}

#[test]
fn first_duplicate_wins() {
    let (matrix, stats) =
        activity::build_with_stats(&[sample(2, 8, 5), sample(2, 8, 50), sample(2, 8, 500)]);
    assert_eq!(matrix.get(Weekday::Wed, 8), 5);
    assert_eq!(stats.duplicates, 2);
    assert_eq!(matrix.dropped(), 0);
}

#[test]
fn out_of_range_samples_are_dropped() {
    let (matrix, stats) = activity::build_with_stats(&[
        sample(-1, 5, 1),
        sample(7, 5, 1),
        sample(0, 24, 1),
        sample(0, -1, 1),
        sample(1, 1, -3),
        sample(1, 1, 2),
    ]);
    assert_eq!(stats.out_of_range, 5);
    assert_eq!(matrix.total(), 2);
    assert_eq!(matrix.dropped(), 5);
}

#[test]
fn build_is_idempotent() {
    let samples = vec![sample(5, 20, 7), sample(1, 3, 2), sample(5, 20, 1)];
    assert_eq!(activity::build(&samples), activity::build(&samples));
}

#[test]
fn totals_and_peak() {
    let matrix = activity::build(&[sample(0, 1, 2), sample(0, 2, 3), sample(6, 2, 10)]);
    let days = matrix.day_totals();
    assert_eq!(days[0], 5);
    assert_eq!(days[6], 10);
    let hours = matrix.hour_totals();
    assert_eq!(hours[2], 13);

    let peak = matrix.peak().unwrap();
    assert_eq!((peak.day, peak.hour, peak.plays), (Weekday::Sun, 2, 10));
}

// ---------------------------------------------------------------------------
// Chart payload
// ---------------------------------------------------------------------------

#[test]
fn chart_has_one_series_per_hour_in_ascending_order() {
    let matrix = activity::build(&[sample(3, 17, 4)]);
    let chart = matrix.chart_data();

    assert_eq!(chart.labels.len(), 7);
    assert_eq!(chart.datasets.len(), 24);
    for (h, series) in chart.datasets.iter().enumerate() {
        assert_eq!(series.hour as usize, h);
        assert_eq!(series.color, activity::hour_color(h as u8));
    }
    assert_eq!(chart.datasets[17].data, [0, 0, 0, 4, 0, 0, 0]);
    assert_eq!(chart.datasets[17].label, "17:00");
}

#[test]
fn chart_serializes_in_stacked_bar_shape() {
    let json = serde_json::to_value(activity::build(&[]).chart_data()).unwrap();
    assert_eq!(json["labels"][0], "Mon");
    assert!(json["datasets"][0]["backgroundColor"].is_string());
    assert_eq!(json["datasets"][0]["data"].as_array().unwrap().len(), 7);
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

#[test]
fn decode_accepts_numeric_strings_and_skips_garbage() {
    let raw = vec![
        json!({"day_of_week": 1, "hour": "08", "plays": 3}),
        json!({"day_of_week": "6", "hour": 23, "plays": 1}),
        json!({"day_of_week": 1, "hour": "late", "plays": 3}),
        json!("not an object"),
    ];
    let (samples, skipped) = decode_samples(&raw);
    assert_eq!(samples.len(), 2);
    assert_eq!(skipped, 2);

    let matrix = activity::build(&samples);
    assert_eq!(matrix.get(Weekday::Tue, 8), 3);
    assert_eq!(matrix.get(Weekday::Sun, 23), 1);
}
