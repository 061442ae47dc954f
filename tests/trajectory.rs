//! Tests for the trajectory estimator.

use approx::assert_relative_eq;
use stormtrack::trajectory::fit_trajectory;

#[test]
fn test_exact_fit_on_linear_motion() {
    // 0.001 deg/s in latitude, -0.0005 deg/s in longitude.
    let samples: Vec<(i64, f64, f64)> = (0..5)
        .map(|i| {
            let t = i as i64 * 100;
            (t, 10.0 + 0.001 * t as f64, -97.0 - 0.0005 * t as f64)
        })
        .collect();

    let model = fit_trajectory(&samples).unwrap();
    assert_relative_eq!(model.lat_velocity, 0.001, max_relative = 1e-9);
    assert_relative_eq!(model.lon_velocity, -0.0005, max_relative = 1e-9);

    let (lat, lon) = model.predict(400);
    assert_relative_eq!(lat, 10.4, max_relative = 1e-9);
    assert_relative_eq!(lon, -97.2, max_relative = 1e-9);
}

#[test]
fn test_robust_to_single_outlier() {
    // Five points on a line plus one detection far off it: the median
    // slope must stay on the line.
    let mut samples: Vec<(i64, f64, f64)> = (0..5)
        .map(|i| {
            let t = i as i64 * 100;
            (t, 10.0 + 0.001 * t as f64, -97.0)
        })
        .collect();
    samples.push((500, 12.5, -96.0));

    let model = fit_trajectory(&samples).unwrap();
    assert_relative_eq!(model.lat_velocity, 0.001, max_relative = 1e-9);
    assert_relative_eq!(model.lat_intercept, 10.0, max_relative = 1e-9);
}

#[test]
fn test_insufficient_data() {
    assert!(fit_trajectory(&[]).is_none());
    assert!(fit_trajectory(&[(0, 10.0, -97.0)]).is_none());
}

#[test]
fn test_all_duplicate_timestamps_are_unfit() {
    // Two detections at the same instant carry no motion information.
    let samples = [(100, 10.0, -97.0), (100, 10.5, -97.5)];
    assert!(fit_trajectory(&samples).is_none());
}

#[test]
fn test_duplicate_timestamps_are_tolerated() {
    // A zero-dt pair is excluded from the slope set, not a failure.
    let samples = [
        (0, 10.0, -97.0),
        (100, 10.1, -97.0),
        (100, 10.2, -97.0),
        (200, 10.2, -97.0),
    ];
    let model = fit_trajectory(&samples).unwrap();
    assert!(model.lat_velocity.is_finite());
    assert!(model.lon_velocity.is_finite());
}

#[test]
fn test_invariant_to_input_order() {
    let ordered = [
        (0, 10.00, -97.00),
        (100, 10.11, -97.02),
        (200, 10.19, -97.05),
        (300, 10.32, -97.06),
    ];
    let mut shuffled = ordered;
    shuffled.swap(0, 3);
    shuffled.swap(1, 2);

    assert_eq!(fit_trajectory(&ordered), fit_trajectory(&shuffled));
}

#[test]
fn test_sensitive_to_membership() {
    let base = [(0, 10.0, -97.0), (100, 10.1, -97.0), (200, 10.2, -97.0)];
    // Same timestamps, one different member: the fit must change.
    let variant = [(0, 10.0, -97.0), (100, 10.1, -97.0), (200, 10.9, -97.0)];
    assert_ne!(fit_trajectory(&base), fit_trajectory(&variant));
}
