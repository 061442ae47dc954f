//! # Track-Association Engine
//!
//! The iterative best-track pipeline over one batch of storm cells:
//!
//! 1. **Main loop** (`main_iterations` times): re-fit every track's
//!    trajectory, then run an association sweep; stops early once a
//!    re-association sweep changes nothing.
//! 2. **Breakup loop** (`breakup_iterations` times): breakup pass then
//!    join pass; stops early once neither changes anything.
//! 3. **Filter**: tracks below `min_cells` are discarded, survivors
//!    closed.
//!
//! When the ingested cell count reaches `big_data_threshold`, the batch
//! partitioner splits the input by UTC calendar day and runs the whole
//! pipeline per partition; tracks never cross a partition boundary and
//! results concatenate with renumbered track ids.

pub(crate) mod association;
pub(crate) mod breakup;
pub(crate) mod join;
pub(crate) mod track_store;

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::config::TrackParams;
use crate::{AssignmentMap, BestTrack, StormCell, TrackId, TrackStatus};
use association::{association_sweep, cells_by_timestamp};
use breakup::breakup_pass;
use join::join_pass;
use track_store::TrackStore;

/// Seconds per UTC calendar day (the partitioning granule).
const SECONDS_PER_DAY: i64 = 86_400;

/// Counters describing one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStats {
    /// Cells ingested
    pub cell_count: usize,
    /// Tracks surviving the filter
    pub track_count: usize,
    /// Breakup splits applied
    pub splits: usize,
    /// Tracks absorbed by joins
    pub merges: usize,
    /// Tracks discarded by the filter
    pub dropped_tracks: usize,
    /// Cells left unassigned after filtering
    pub dropped_cells: usize,
    /// Batch partitions processed (1 unless big-data mode was active)
    pub partitions: usize,
}

impl TrackingStats {
    fn accumulate(&mut self, other: &TrackingStats) {
        self.cell_count += other.cell_count;
        self.track_count += other.track_count;
        self.splits += other.splits;
        self.merges += other.merges;
        self.dropped_tracks += other.dropped_tracks;
        self.dropped_cells += other.dropped_cells;
        self.partitions += other.partitions;
    }
}

/// Final output of one engine run: surviving tracks, the authoritative
/// cell-to-track assignment map, and run counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingResult {
    pub tracks: Vec<BestTrack>,
    pub assignments: AssignmentMap,
    pub stats: TrackingStats,
}

/// Result slice at one distinct member timestamp: the assignments made
/// there plus the owning tracks with their fitted models.
#[derive(Debug, Clone, Serialize)]
pub struct TimestepSnapshot<'a> {
    pub assignments: BTreeMap<&'a str, TrackId>,
    pub tracks: Vec<&'a BestTrack>,
}

impl TrackingResult {
    /// Group the result by distinct member timestamp. Each snapshot
    /// carries the cell-to-track assignments active at that timestamp and
    /// the tracks those cells belong to, so per-timestep emission keeps
    /// the trajectory models alongside the assignment map.
    pub fn per_timestep(&self) -> BTreeMap<i64, TimestepSnapshot<'_>> {
        let mut by_time: BTreeMap<i64, TimestepSnapshot<'_>> = BTreeMap::new();
        for track in &self.tracks {
            // Member timestamps are strictly increasing, so each track
            // touches a given timestamp at most once.
            for (cell_id, &ts) in track.cell_ids.iter().zip(&track.timestamps) {
                let snapshot = by_time.entry(ts).or_insert_with(|| TimestepSnapshot {
                    assignments: BTreeMap::new(),
                    tracks: Vec::new(),
                });
                snapshot.assignments.insert(cell_id, track.id);
                snapshot.tracks.push(track);
            }
        }
        by_time
    }
}

/// Processing strategy, chosen once from the validated cell count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BatchStrategy {
    /// Whole batch in one pipeline run
    Single,
    /// One pipeline run per UTC calendar day
    PerDay,
}

/// Run the full best-track pipeline over a batch of cells.
///
/// Cells are sorted by (timestamp, id) up front so every sweep and
/// tie-break is reproducible; running twice on identical input yields an
/// identical [`AssignmentMap`].
pub fn run_tracking(mut cells: Vec<StormCell>, params: &TrackParams) -> TrackingResult {
    cells.sort_by(|a, b| (a.timestamp, &a.id).cmp(&(b.timestamp, &b.id)));

    let strategy = if cells.len() >= params.big_data_threshold {
        BatchStrategy::PerDay
    } else {
        BatchStrategy::Single
    };
    info!(
        "tracking {} cells ({:?} strategy)",
        cells.len(),
        strategy
    );

    match strategy {
        BatchStrategy::Single => {
            let mut result = run_partition(&cells, params);
            result.stats.partitions = 1;
            result
        }
        BatchStrategy::PerDay => run_partitioned(&cells, params),
    }
}

/// Big-data mode: partition by calendar day, run the pipeline per
/// partition, and concatenate with sequentially renumbered track ids.
fn run_partitioned(cells: &[StormCell], params: &TrackParams) -> TrackingResult {
    // Cells are time-sorted, so each day is a contiguous slice.
    let partitions: Vec<&[StormCell]> = cells
        .chunk_by(|a, b| {
            a.timestamp.div_euclid(SECONDS_PER_DAY) == b.timestamp.div_euclid(SECONDS_PER_DAY)
        })
        .collect();
    info!("big-data mode: {} daily partitions", partitions.len());

    #[cfg(feature = "parallel")]
    let partial: Vec<TrackingResult> = {
        use rayon::prelude::*;
        partitions
            .par_iter()
            .map(|slice| run_partition(slice, params))
            .collect()
    };

    #[cfg(not(feature = "parallel"))]
    let partial: Vec<TrackingResult> = partitions
        .iter()
        .map(|slice| run_partition(slice, params))
        .collect();

    // Concatenation order follows partition order, so renumbering is
    // deterministic regardless of how partitions were scheduled.
    let mut tracks = Vec::new();
    let mut assignments = AssignmentMap::new();
    let mut stats = TrackingStats::default();
    let mut next_id: TrackId = 1;

    for mut part in partial {
        stats.accumulate(&part.stats);
        stats.partitions += 1;
        for mut track in part.tracks.drain(..) {
            let new_id = next_id;
            next_id += 1;
            for cell_id in &track.cell_ids {
                assignments.insert(cell_id.clone(), new_id);
            }
            track.id = new_id;
            tracks.push(track);
        }
    }
    stats.track_count = tracks.len();

    TrackingResult {
        tracks,
        assignments,
        stats,
    }
}

/// The full pipeline over one partition's cells.
fn run_partition(cells: &[StormCell], params: &TrackParams) -> TrackingResult {
    let by_time = cells_by_timestamp(cells);
    let mut store = TrackStore::new(cells.len());
    let mut stats = TrackingStats {
        cell_count: cells.len(),
        ..TrackingStats::default()
    };

    // Main loop: trajectory re-fit alternating with association.
    for iteration in 0..params.main_iterations {
        store.refit_all(cells);
        let seeding = iteration == 0;
        let changes = association_sweep(&mut store, cells, &by_time, params, seeding);
        debug!("main iteration {iteration}: {changes} changes");
        if !seeding && changes == 0 {
            break;
        }
    }
    store.refit_all(cells);

    // Breakup loop: splits alternating with joins.
    for iteration in 0..params.breakup_iterations {
        let splits = breakup_pass(&mut store, cells, params);
        let merges = join_pass(&mut store, cells, params);
        stats.splits += splits;
        stats.merges += merges;
        debug!("breakup iteration {iteration}: {splits} splits, {merges} merges");
        if splits == 0 && merges == 0 {
            break;
        }
    }

    // Filter: discard tracks that never accumulated enough support.
    for track_id in store.track_ids() {
        let len = store.track(track_id).cells.len();
        if len < params.min_cells {
            stats.dropped_tracks += 1;
            stats.dropped_cells += len;
            store.discard_track(track_id);
        } else {
            store.close_track(track_id);
        }
    }

    let (tracks, assignments) = finalize(&store, cells);
    stats.track_count = tracks.len();
    info!(
        "partition complete: {} cells -> {} tracks ({} splits, {} merges, {} dropped)",
        stats.cell_count, stats.track_count, stats.splits, stats.merges, stats.dropped_tracks
    );

    TrackingResult {
        tracks,
        assignments,
        stats,
    }
}

/// Convert the closed store contents into the public result types.
fn finalize(store: &TrackStore, cells: &[StormCell]) -> (Vec<BestTrack>, AssignmentMap) {
    let mut tracks = Vec::with_capacity(store.len());
    let mut assignments = AssignmentMap::new();

    for track_id in store.track_ids() {
        let track = store.track(track_id);
        if track.status != TrackStatus::Closed {
            continue;
        }
        let cell_ids: Vec<String> = track
            .cells
            .iter()
            .map(|&idx| cells[idx].id.clone())
            .collect();
        for cell_id in &cell_ids {
            assignments.insert(cell_id.clone(), track_id);
        }
        let timestamps: Vec<i64> = track.cells.iter().map(|&idx| cells[idx].timestamp).collect();
        tracks.push(BestTrack {
            id: track_id,
            model: track.model,
            cell_ids,
            timestamps,
        });
    }

    (tracks, assignments)
}
