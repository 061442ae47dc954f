//! Tests for the ingestion contract types.

use chrono::NaiveDate;
use stormtrack::{CellBatch, StormCell, StormTrackError, TimeWindow};

fn utc_midnight(year: i32, month: u32, day: u32) -> i64 {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc()
        .timestamp()
}

#[test]
fn test_year_granularity() {
    let window = TimeWindow::parse("2021", "2021").unwrap();
    assert_eq!(window.start, utc_midnight(2021, 1, 1));
    assert_eq!(window.end, utc_midnight(2022, 1, 1));
    assert!(window.contains(utc_midnight(2021, 7, 4)));
    assert!(!window.contains(utc_midnight(2022, 1, 1)));
}

#[test]
fn test_month_granularity() {
    let window = TimeWindow::parse("2021-02", "2021-12").unwrap();
    assert_eq!(window.start, utc_midnight(2021, 2, 1));
    assert_eq!(window.end, utc_midnight(2022, 1, 1));
}

#[test]
fn test_day_granularity() {
    let window = TimeWindow::parse("2021-06-15", "2021-06-15").unwrap();
    assert_eq!(window.start, utc_midnight(2021, 6, 15));
    assert_eq!(window.end, utc_midnight(2021, 6, 16));
    assert!(window.contains(utc_midnight(2021, 6, 15) + 3600));
}

#[test]
fn test_full_timestamp_granularity() {
    let window =
        TimeWindow::parse("2021-06-15T12:00:00Z", "2021-06-15T18:30:00Z").unwrap();
    assert_eq!(window.start, utc_midnight(2021, 6, 15) + 12 * 3600);
    assert_eq!(window.end, utc_midnight(2021, 6, 15) + 18 * 3600 + 1800);
}

#[test]
fn test_malformed_bound_is_rejected() {
    for bad in ["21", "2021-13", "2021-06-32", "yesterday"] {
        match TimeWindow::parse(bad, "2022") {
            Err(StormTrackError::BadTimeBound { value }) => assert_eq!(value, bad),
            other => panic!("expected BadTimeBound for {bad:?}, got {other:?}"),
        }
    }
}

#[test]
fn test_batch_filters_by_window_and_collects_dates() {
    let window = TimeWindow::parse("2021-06-15", "2021-06-16").unwrap();
    let inside_day1 = utc_midnight(2021, 6, 15) + 600;
    let inside_day2 = utc_midnight(2021, 6, 16) + 600;
    let outside = utc_midnight(2021, 6, 20);

    let mut batch = CellBatch::new();
    batch.push_file(
        vec![
            StormCell::new("a", 35.0, -97.0, inside_day1),
            StormCell::new("b", 35.1, -97.0, outside),
        ],
        &window,
    );
    batch.push_file(
        vec![StormCell::new("c", 35.2, -97.0, inside_day2)],
        &window,
    );

    assert_eq!(batch.file_count, 2);
    assert_eq!(batch.cells.len(), 2);
    assert_eq!(batch.dates.len(), 2);
    assert!(batch.dates.contains(&NaiveDate::from_ymd_opt(2021, 6, 15).unwrap()));
    assert!(batch.dates.contains(&NaiveDate::from_ymd_opt(2021, 6, 16).unwrap()));
}

#[test]
fn test_empty_batch() {
    let batch = CellBatch::new();
    assert!(batch.is_empty());
    assert_eq!(batch.file_count, 0);
}
