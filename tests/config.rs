//! Tests for parameter validation.

use stormtrack::{StormTrackError, TrackParams};

#[test]
fn test_defaults_are_valid() {
    assert!(TrackParams::default().validate().is_ok());
}

#[test]
fn test_out_of_range_buffer_distance() {
    for bad in [0.0, -1.0, 20.1] {
        let params = TrackParams {
            buffer_distance_km: bad,
            ..TrackParams::default()
        };
        let violations = params.validate().unwrap_err();
        assert!(violations.iter().any(|v| v.field == "buffer_distance_km"));
    }
}

#[test]
fn test_buffer_distance_upper_bound_inclusive() {
    let params = TrackParams {
        buffer_distance_km: 20.0,
        join_distance_km: 20.0,
        ..TrackParams::default()
    };
    assert!(params.validate().is_ok());
}

#[test]
fn test_join_buffers_must_dominate_association_buffers() {
    let params = TrackParams {
        buffer_distance_km: 10.0,
        join_distance_km: 5.0,
        buffer_time_min: 16.0,
        join_time_min: 10.0,
        ..TrackParams::default()
    };
    let violations = params.validate().unwrap_err();
    let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
    assert!(fields.contains(&"join_distance_km"));
    assert!(fields.contains(&"join_time_min"));
}

#[test]
fn test_iteration_budgets() {
    let params = TrackParams {
        main_iterations: 2,
        breakup_iterations: 6,
        ..TrackParams::default()
    };
    let violations = params.validate().unwrap_err();
    let fields: Vec<&str> = violations.iter().map(|v| v.field).collect();
    assert!(fields.contains(&"main_iterations"));
    assert!(fields.contains(&"breakup_iterations"));
}

#[test]
fn test_min_cells_range() {
    for bad in [0usize, 1, 13] {
        let params = TrackParams {
            min_cells: bad,
            ..TrackParams::default()
        };
        assert!(params.validate().is_err(), "min_cells = {bad} must be rejected");
    }
}

#[test]
fn test_violation_message_names_value_and_range() {
    let params = TrackParams {
        buffer_time_min: 30.0,
        join_time_min: 21.0,
        ..TrackParams::default()
    };
    let violations = params.validate().unwrap_err();
    let text = violations[0].to_string();
    assert!(text.contains("buffer_time_min"));
    assert!(text.contains("30"));
    assert!(text.contains("(0, 21]"));
}

#[test]
fn test_validated_wraps_into_error() {
    let params = TrackParams {
        big_data_threshold: 0,
        ..TrackParams::default()
    };
    match params.validated() {
        Err(StormTrackError::InvalidParams(violations)) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "big_data_threshold");
        }
        other => panic!("expected InvalidParams, got {other:?}"),
    }
}

#[test]
fn test_json_roundtrip_with_partial_overrides() {
    // Absent fields fall back to defaults.
    let params: TrackParams =
        serde_json::from_str(r#"{"buffer_distance_km": 5.0, "min_cells": 3}"#).unwrap();
    assert_eq!(params.buffer_distance_km, 5.0);
    assert_eq!(params.min_cells, 3);
    assert_eq!(params.main_iterations, TrackParams::default().main_iterations);
}
