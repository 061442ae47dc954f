//! Robust linear trajectory estimation (Theil–Sen).
//!
//! Fits position-versus-time lines to a track's member cells using the
//! median of pairwise slopes, independently for latitude and longitude.
//! Resistant to a minority of outlier detections, unlike least squares.

use serde::{Deserialize, Serialize};

/// A fitted linear motion model: position as a function of time.
///
/// Velocities are in degrees per second; intercepts are the modeled
/// position at timestamp zero (unix epoch). Recomputed whenever track
/// membership changes; never persisted apart from its track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryModel {
    pub lat_velocity: f64,
    pub lon_velocity: f64,
    pub lat_intercept: f64,
    pub lon_intercept: f64,
}

impl TrajectoryModel {
    /// Extrapolated (latitude, longitude) at `timestamp`.
    pub fn predict(&self, timestamp: i64) -> (f64, f64) {
        let t = timestamp as f64;
        (
            self.lat_intercept + self.lat_velocity * t,
            self.lon_intercept + self.lon_velocity * t,
        )
    }
}

/// Fit a [`TrajectoryModel`] to `(timestamp, latitude, longitude)` samples.
///
/// Requires at least two samples with distinct timestamps; otherwise the
/// track is unfit and `None` is returned. Zero-Δt pairs are excluded from
/// the slope set, so duplicate timestamps are tolerated. Pure function;
/// the result does not depend on input order (medians sort internally).
pub fn fit_trajectory(samples: &[(i64, f64, f64)]) -> Option<TrajectoryModel> {
    let n = samples.len();
    if n < 2 {
        return None;
    }

    let mut lat_slopes = Vec::with_capacity(n * (n - 1) / 2);
    let mut lon_slopes = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let dt = (samples[j].0 - samples[i].0) as f64;
            if dt == 0.0 {
                continue;
            }
            lat_slopes.push((samples[j].1 - samples[i].1) / dt);
            lon_slopes.push((samples[j].2 - samples[i].2) / dt);
        }
    }
    if lat_slopes.is_empty() {
        // All timestamps coincide: no usable motion information.
        return None;
    }

    let lat_velocity = median(&mut lat_slopes);
    let lon_velocity = median(&mut lon_slopes);

    // Median residual intercept anchors the line robustly.
    let mut lat_residuals: Vec<f64> = samples
        .iter()
        .map(|&(t, lat, _)| lat - lat_velocity * t as f64)
        .collect();
    let mut lon_residuals: Vec<f64> = samples
        .iter()
        .map(|&(t, _, lon)| lon - lon_velocity * t as f64)
        .collect();

    Some(TrajectoryModel {
        lat_velocity,
        lon_velocity,
        lat_intercept: median(&mut lat_residuals),
        lon_intercept: median(&mut lon_residuals),
    })
}

/// Lower-median of a non-empty slice: always an observed value, so ties
/// resolve identically on every run.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    values[(values.len() - 1) / 2]
}
