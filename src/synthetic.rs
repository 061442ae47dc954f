//! Synthetic storm-cell detection generator for tests and benchmarks.
//!
//! Generates seeded batches of detections following linear storm motions
//! with configurable positional noise, detection dropouts, and outliers,
//! and returns the ground-truth storm membership for validation.
//!
//! Feature-gated behind `synthetic` — not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use stormtrack::synthetic::StormScenario;
//!
//! let scenario = StormScenario {
//!     storm_count: 10,
//!     scans_per_storm: 12,
//!     seed: 42,
//!     ..StormScenario::default()
//! };
//! let dataset = scenario.generate();
//! assert_eq!(dataset.cells.len(), dataset.ground_truth.len());
//! ```

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::StormCell;

/// Meters per degree of latitude.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Configuration for a synthetic detection batch.
#[derive(Debug, Clone)]
pub struct StormScenario {
    /// Number of independent storms
    pub storm_count: usize,
    /// Detections per storm (one per scan interval)
    pub scans_per_storm: usize,
    /// Seconds between consecutive scans
    pub scan_interval_s: i64,
    /// Unix timestamp of the first scan
    pub start_timestamp: i64,
    /// Center of the spawn region
    pub origin: (f64, f64),
    /// Half-extent of the spawn region in degrees
    pub spawn_spread_deg: f64,
    /// Storm speed range in km/h
    pub speed_kmh: (f64, f64),
    /// 1-sigma positional noise per detection, meters
    pub noise_sigma_m: f64,
    /// Probability that any single detection is missing
    pub dropout_rate: f64,
    /// RNG seed for reproducible batches
    pub seed: u64,
}

impl Default for StormScenario {
    fn default() -> Self {
        Self {
            storm_count: 20,
            scans_per_storm: 12,
            scan_interval_s: 300,
            start_timestamp: 1_700_000_000,
            origin: (35.0, -97.0),
            spawn_spread_deg: 2.0,
            speed_kmh: (20.0, 60.0),
            noise_sigma_m: 500.0,
            dropout_rate: 0.0,
            seed: 42,
        }
    }
}

/// A generated batch plus its ground truth.
#[derive(Debug, Clone)]
pub struct SyntheticDataset {
    pub cells: Vec<StormCell>,
    /// Cell id -> index of the storm that produced it
    pub ground_truth: HashMap<String, usize>,
}

impl StormScenario {
    /// Generate a batch of detections. Identical scenarios (including
    /// seed) generate identical batches.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut cells = Vec::new();
        let mut ground_truth = HashMap::new();

        for storm in 0..self.storm_count {
            let lat0 = self.origin.0 + rng.gen_range(-self.spawn_spread_deg..self.spawn_spread_deg);
            let lon0 = self.origin.1 + rng.gen_range(-self.spawn_spread_deg..self.spawn_spread_deg);
            let speed_ms = rng.gen_range(self.speed_kmh.0..self.speed_kmh.1) / 3.6;
            let bearing: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
            let lat_velocity = speed_ms * bearing.cos() / METERS_PER_DEGREE;
            let lon_velocity = speed_ms * bearing.sin()
                / (METERS_PER_DEGREE * lat0.to_radians().cos().abs().max(0.01));

            for scan in 0..self.scans_per_storm {
                if self.dropout_rate > 0.0 && rng.gen_bool(self.dropout_rate) {
                    continue;
                }
                let dt = (scan as i64 * self.scan_interval_s) as f64;
                let noise_deg = self.noise_sigma_m / METERS_PER_DEGREE;
                let lat = lat0 + lat_velocity * dt + rng.gen_range(-noise_deg..=noise_deg);
                let lon = lon0 + lon_velocity * dt + rng.gen_range(-noise_deg..=noise_deg);

                let id = format!("storm{storm:03}-scan{scan:03}");
                let timestamp = self.start_timestamp + scan as i64 * self.scan_interval_s;
                ground_truth.insert(id.clone(), storm);
                cells.push(StormCell::with_source(&id, lat, lon, timestamp, "synthetic"));
            }
        }

        SyntheticDataset {
            cells,
            ground_truth,
        }
    }
}
