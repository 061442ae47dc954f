//! Engine parameters and structured validation.
//!
//! Parameters form a named key-value object with explicit defaults; a
//! JSON parameter file may override any subset of fields. Validation
//! returns the full list of violated constraints rather than aborting,
//! so callers decide exit behavior.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StormTrackError};

/// Validated parameter set consumed by the tracking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackParams {
    /// Max spatial deviation (km) to accept a cell into a track. (0, 20]
    pub buffer_distance_km: f64,
    /// Max temporal gap (minutes) to accept a cell into a track. (0, 21]
    pub buffer_time_min: f64,
    /// Max spatial gap (km) to merge two tracks. [buffer_distance_km, 70]
    pub join_distance_km: f64,
    /// Max temporal gap (minutes) to merge two tracks. [buffer_time_min, 21]
    pub join_time_min: f64,
    /// Minimum cells for a track to survive filtering. [2, 12]
    pub min_cells: usize,
    /// Association / trajectory re-fit cycles. [3, 25]
    pub main_iterations: u32,
    /// Breakup / join cycles. [1, 5]
    pub breakup_iterations: u32,
    /// Cell count at which batch partitioning activates. >= 1
    pub big_data_threshold: usize,
    /// Emit one output artifact per time step instead of one aggregate.
    pub per_timestep_output: bool,
}

impl Default for TrackParams {
    fn default() -> Self {
        Self {
            buffer_distance_km: 10.0,
            buffer_time_min: 16.0,
            join_distance_km: 30.0,
            join_time_min: 16.0,
            min_cells: 2,
            main_iterations: 5,
            breakup_iterations: 3,
            big_data_threshold: 300_000,
            per_timestep_output: false,
        }
    }
}

/// A single violated parameter constraint: the field, the offending
/// value, and the allowed range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamViolation {
    pub field: &'static str,
    pub value: String,
    pub allowed: String,
}

impl fmt::Display for ParamViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = {} is outside the valid range {}",
            self.field, self.value, self.allowed
        )
    }
}

impl TrackParams {
    /// Load parameters from a JSON file, applying defaults for absent
    /// fields. A missing or malformed file is a configuration error.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| StormTrackError::CorruptConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| StormTrackError::CorruptConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Check every constraint, collecting all violations.
    pub fn validate(&self) -> std::result::Result<(), Vec<ParamViolation>> {
        let mut violations = Vec::new();

        if !(self.buffer_distance_km > 0.0 && self.buffer_distance_km <= 20.0) {
            violations.push(violation("buffer_distance_km", self.buffer_distance_km, "(0, 20]"));
        }
        if !(self.buffer_time_min > 0.0 && self.buffer_time_min <= 21.0) {
            violations.push(violation("buffer_time_min", self.buffer_time_min, "(0, 21]"));
        }
        if !(self.join_distance_km >= self.buffer_distance_km && self.join_distance_km <= 70.0) {
            violations.push(violation(
                "join_distance_km",
                self.join_distance_km,
                "[buffer_distance_km, 70]",
            ));
        }
        if !(self.join_time_min >= self.buffer_time_min && self.join_time_min <= 21.0) {
            violations.push(violation(
                "join_time_min",
                self.join_time_min,
                "[buffer_time_min, 21]",
            ));
        }
        if !(2..=12).contains(&self.min_cells) {
            violations.push(violation("min_cells", self.min_cells, "[2, 12]"));
        }
        if !(3..=25).contains(&self.main_iterations) {
            violations.push(violation("main_iterations", self.main_iterations, "[3, 25]"));
        }
        if !(1..=5).contains(&self.breakup_iterations) {
            violations.push(violation("breakup_iterations", self.breakup_iterations, "[1, 5]"));
        }
        if self.big_data_threshold == 0 {
            violations.push(violation("big_data_threshold", self.big_data_threshold, ">= 1"));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    /// Validate, converting violations into a [`StormTrackError`].
    pub fn validated(self) -> Result<Self> {
        self.validate().map_err(StormTrackError::InvalidParams)?;
        Ok(self)
    }

    // Engine-unit accessors.

    pub fn buffer_distance_m(&self) -> f64 {
        self.buffer_distance_km * 1000.0
    }

    pub fn buffer_time_s(&self) -> f64 {
        self.buffer_time_min * 60.0
    }

    pub fn join_distance_m(&self) -> f64 {
        self.join_distance_km * 1000.0
    }

    pub fn join_time_s(&self) -> f64 {
        self.join_time_min * 60.0
    }
}

fn violation(field: &'static str, value: impl fmt::Display, allowed: &str) -> ParamViolation {
    ParamViolation {
        field,
        value: value.to_string(),
        allowed: allowed.to_string(),
    }
}
