//! Mutable collection of in-progress tracks.
//!
//! Owns the assignment invariants: every cell belongs to at most one
//! track, and a track holds at most one cell per timestamp with members
//! kept in strictly increasing timestamp order. Cells are referenced by
//! index into the partition's immutable cell slice.

use std::collections::BTreeMap;

use crate::trajectory::{fit_trajectory, TrajectoryModel};
use crate::{StormCell, TrackId, TrackStatus};

/// One in-progress track: ordered member indices plus the current fit.
#[derive(Debug, Clone)]
pub(crate) struct Track {
    pub id: TrackId,
    /// Indices into the partition cell slice, strictly increasing by timestamp
    pub cells: Vec<usize>,
    /// Current motion model; `None` while fewer than two distinct timestamps
    pub model: Option<TrajectoryModel>,
    pub status: TrackStatus,
}

impl Track {
    fn new(id: TrackId, cell_idx: usize) -> Self {
        Self {
            id,
            cells: vec![cell_idx],
            model: None,
            status: TrackStatus::Open,
        }
    }

    pub fn first_timestamp(&self, cells: &[StormCell]) -> i64 {
        cells[self.cells[0]].timestamp
    }

    pub fn last_timestamp(&self, cells: &[StormCell]) -> i64 {
        cells[*self.cells.last().expect("track is never empty")].timestamp
    }

    /// Smallest |timestamp - member timestamp| over members, skipping the
    /// member equal to `exclude` (the cell being re-evaluated).
    pub fn nearest_gap(&self, timestamp: i64, exclude: Option<usize>, cells: &[StormCell]) -> Option<i64> {
        self.cells
            .iter()
            .filter(|&&idx| Some(idx) != exclude)
            .map(|&idx| (timestamp - cells[idx].timestamp).abs())
            .min()
    }

    /// Whether some member other than `exclude` already occupies `timestamp`.
    pub fn occupies_timestamp(&self, timestamp: i64, exclude: Option<usize>, cells: &[StormCell]) -> bool {
        self.cells
            .iter()
            .any(|&idx| Some(idx) != exclude && cells[idx].timestamp == timestamp)
    }

    /// Position the track presents for matching at `timestamp`: the model
    /// extrapolation when fit, otherwise the observed position of the
    /// temporally nearest member (direct matching for unfit tracks, and
    /// for tracks still growing inside the seeding sweep).
    pub fn anchor_position(&self, timestamp: i64, cells: &[StormCell]) -> (f64, f64) {
        match self.model {
            Some(model) => model.predict(timestamp),
            None => {
                let &idx = self
                    .cells
                    .iter()
                    .min_by_key(|&&idx| {
                        ((cells[idx].timestamp - timestamp).abs(), cells[idx].timestamp)
                    })
                    .expect("track is never empty");
                (cells[idx].latitude, cells[idx].longitude)
            }
        }
    }

    /// Recompute the motion model from current membership.
    pub fn refit(&mut self, cells: &[StormCell]) {
        let samples: Vec<(i64, f64, f64)> = self
            .cells
            .iter()
            .map(|&idx| {
                let c = &cells[idx];
                (c.timestamp, c.latitude, c.longitude)
            })
            .collect();
        self.model = fit_trajectory(&samples);
    }

    fn insert_ordered(&mut self, cell_idx: usize, cells: &[StormCell]) {
        let ts = cells[cell_idx].timestamp;
        let pos = self
            .cells
            .partition_point(|&idx| cells[idx].timestamp < ts);
        self.cells.insert(pos, cell_idx);
        debug_assert!(self.timestamps_strictly_increasing(cells));
    }

    fn timestamps_strictly_increasing(&self, cells: &[StormCell]) -> bool {
        self.cells
            .windows(2)
            .all(|w| cells[w[0]].timestamp < cells[w[1]].timestamp)
    }
}

/// The track store: all tracks for one partition plus the cell-to-track
/// assignment state.
#[derive(Debug)]
pub(crate) struct TrackStore {
    tracks: BTreeMap<TrackId, Track>,
    /// Owning track per cell index; `None` = unassigned
    cell_track: Vec<Option<TrackId>>,
    next_id: TrackId,
}

impl TrackStore {
    pub fn new(cell_count: usize) -> Self {
        Self {
            tracks: BTreeMap::new(),
            cell_track: vec![None; cell_count],
            next_id: 1,
        }
    }

    pub fn track(&self, id: TrackId) -> &Track {
        &self.tracks[&id]
    }

    pub fn get(&self, id: TrackId) -> Option<&Track> {
        self.tracks.get(&id)
    }

    /// Track ids in ascending order (deterministic iteration).
    pub fn track_ids(&self) -> Vec<TrackId> {
        self.tracks.keys().copied().collect()
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn owner_of(&self, cell_idx: usize) -> Option<TrackId> {
        self.cell_track[cell_idx]
    }

    /// Seed a new single-cell track.
    pub fn create_track(&mut self, cell_idx: usize) -> TrackId {
        debug_assert!(self.cell_track[cell_idx].is_none());
        let id = self.next_id;
        self.next_id += 1;
        self.tracks.insert(id, Track::new(id, cell_idx));
        self.cell_track[cell_idx] = Some(id);
        id
    }

    /// Assign an unowned cell to an existing track.
    pub fn assign(&mut self, cell_idx: usize, track_id: TrackId, cells: &[StormCell]) {
        debug_assert!(self.cell_track[cell_idx].is_none());
        let track = self.tracks.get_mut(&track_id).expect("assign to live track");
        track.insert_ordered(cell_idx, cells);
        self.cell_track[cell_idx] = Some(track_id);
    }

    /// Move a cell between tracks. Removes the source track if it empties.
    pub fn move_cell(&mut self, cell_idx: usize, to: TrackId, cells: &[StormCell]) {
        let from = self.cell_track[cell_idx].expect("moved cell is assigned");
        if from == to {
            return;
        }
        let source = self.tracks.get_mut(&from).expect("source track exists");
        source.cells.retain(|&idx| idx != cell_idx);
        if source.cells.is_empty() {
            self.tracks.remove(&from);
        }
        self.cell_track[cell_idx] = None;
        self.assign(cell_idx, to, cells);
    }

    /// Split a track before `at` (member position, not cell index): the
    /// prefix keeps the id, the suffix becomes a new open track. Both
    /// halves are re-fit. Returns the suffix id.
    pub fn split_track(&mut self, track_id: TrackId, at: usize, cells: &[StormCell]) -> TrackId {
        let suffix = {
            let track = self.tracks.get_mut(&track_id).expect("split a live track");
            debug_assert!(at >= 1 && at < track.cells.len());
            let suffix = track.cells.split_off(at);
            track.refit(cells);
            suffix
        };

        let new_id = self.next_id;
        self.next_id += 1;
        for &idx in &suffix {
            self.cell_track[idx] = Some(new_id);
        }
        let mut child = Track {
            id: new_id,
            cells: suffix,
            model: None,
            status: TrackStatus::Open,
        };
        child.refit(cells);
        self.tracks.insert(new_id, child);
        new_id
    }

    /// Absorb `victim` into `target`, appending its cells (caller has
    /// verified the victim starts strictly after the target ends). The
    /// victim is retired and the target re-fit.
    pub fn absorb(&mut self, target: TrackId, victim: TrackId, cells: &[StormCell]) {
        let victim_track = self.tracks.remove(&victim).expect("victim track exists");
        for &idx in &victim_track.cells {
            self.cell_track[idx] = Some(target);
        }
        let track = self.tracks.get_mut(&target).expect("target track exists");
        debug_assert!(
            cells[victim_track.cells[0]].timestamp > track.last_timestamp(cells),
            "absorbed track must start after the target ends"
        );
        track.cells.extend(victim_track.cells);
        debug_assert!(track.timestamps_strictly_increasing(cells));
        track.refit(cells);
    }

    /// Drop a track entirely; its cells become permanently unassigned.
    pub fn discard_track(&mut self, track_id: TrackId) {
        if let Some(track) = self.tracks.remove(&track_id) {
            for idx in track.cells {
                self.cell_track[idx] = None;
            }
        }
    }

    /// Mark a surviving track closed.
    pub fn close_track(&mut self, track_id: TrackId) {
        if let Some(track) = self.tracks.get_mut(&track_id) {
            track.status = TrackStatus::Closed;
        }
    }

    /// Re-fit every track's motion model.
    pub fn refit_all(&mut self, cells: &[StormCell]) {
        for track in self.tracks.values_mut() {
            track.refit(cells);
        }
    }
}
