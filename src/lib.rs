//! # Stormtrack
//!
//! Storm-cell best-track association engine.
//!
//! Associates discrete, time-stamped storm-cell detections from
//! heterogeneous detection sources into continuous multi-time "best
//! tracks". The engine alternates association sweeps with robust
//! Theil–Sen trajectory re-fits, then alternates breakup and join passes,
//! and finally filters out tracks with too few supporting detections.
//!
//! This library provides:
//! - Robust linear trajectory estimation (median of pairwise slopes)
//! - Per-timestamp association of cells to extrapolated track positions
//! - Residual-based track breakup and Union-Find transitive track joining
//! - Calendar-day batch partitioning for large detection volumes
//! - Deterministic tie-breaks throughout (reruns yield identical output)
//!
//! ## Features
//!
//! - **`parallel`** - Process batch partitions concurrently with rayon
//! - **`synthetic`** - Seeded synthetic detection generator (rand)
//!
//! ## Quick start
//!
//! ```rust
//! use stormtrack::{run_tracking, StormCell, TrackParams};
//!
//! let cells = vec![
//!     StormCell::new("c0", 35.00, -97.00, 0),
//!     StormCell::new("c1", 35.01, -97.00, 300),
//!     StormCell::new("c2", 35.02, -97.00, 600),
//! ];
//!
//! let params = TrackParams::default().validated().unwrap();
//! let result = run_tracking(cells, &params);
//! assert_eq!(result.tracks.len(), 1);
//! assert_eq!(result.tracks[0].cell_ids.len(), 3);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, StormTrackError};

// Parameter surface and validation
pub mod config;
pub use config::{ParamViolation, TrackParams};

// Geographic utilities (single distance metric for every pass)
pub mod geo_utils;

// Union-Find for transitive track joining
pub mod union_find;
pub use union_find::UnionFind;

// Robust trajectory estimation
pub mod trajectory;
pub use trajectory::{fit_trajectory, TrajectoryModel};

// Ingestion contract
pub mod ingest;
pub use ingest::{CellBatch, TimeWindow};

// The track-association engine
pub mod engine;
pub use engine::{run_tracking, TimestepSnapshot, TrackingResult, TrackingStats};

// Seeded synthetic detection generator for tests and benchmarks
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// Identifier for a track within one engine run.
pub type TrackId = u64;

/// Authoritative mapping from cell id to owning track id. Unassigned
/// cells are absent from the map; there is no sentinel track.
pub type AssignmentMap = BTreeMap<String, TrackId>;

/// A single storm-cell detection: one storm object at one instant.
///
/// Produced once by an ingestion adapter and never mutated; passes share
/// cells read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StormCell {
    /// Unique identifier across the ingested batch
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Originating detection source (algorithm or file tag)
    #[serde(default)]
    pub source: String,
}

impl StormCell {
    /// Create a cell with no source metadata.
    pub fn new(id: &str, latitude: f64, longitude: f64, timestamp: i64) -> Self {
        Self {
            id: id.to_string(),
            latitude,
            longitude,
            timestamp,
            source: String::new(),
        }
    }

    /// Create a cell tagged with its originating source.
    pub fn with_source(
        id: &str,
        latitude: f64,
        longitude: f64,
        timestamp: i64,
        source: &str,
    ) -> Self {
        Self {
            source: source.to_string(),
            ..Self::new(id, latitude, longitude, timestamp)
        }
    }

    /// Check that the position is a usable coordinate.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Lifecycle status of a track: `Open` while iterating, `Closed` once it
/// survives the final filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackStatus {
    Open,
    Closed,
}

/// A finalized best track: its member cell ids in timestamp order, the
/// fitted motion model, and the covered time span.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestTrack {
    pub id: TrackId,
    /// Member cell ids, ordered by strictly increasing timestamp
    pub cell_ids: Vec<String>,
    /// Member timestamps, aligned with `cell_ids`
    pub timestamps: Vec<i64>,
    /// Fitted motion model; `None` only for unfit tracks
    pub model: Option<TrajectoryModel>,
}

impl BestTrack {
    /// Timestamp of the first member cell.
    pub fn start_timestamp(&self) -> i64 {
        self.timestamps[0]
    }

    /// Timestamp of the last member cell.
    pub fn end_timestamp(&self) -> i64 {
        *self.timestamps.last().expect("tracks are never empty")
    }
}
