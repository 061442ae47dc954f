//! Association pass: match cells to tracks per timestamp.
//!
//! For each distinct timestamp in ascending order, every cell at that
//! timestamp is matched against the extrapolated positions of open
//! tracks. Acceptance requires distance <= buffer_distance and temporal
//! gap <= buffer_time (both inclusive); among eligible tracks the nearest
//! wins, ties broken by smallest track id. Unmatched cells seed new
//! single-cell tracks on the seeding sweep; on re-association sweeps a
//! cell moves only when a different track wins the same contest.
//!
//! An R-tree over track anchor positions prefilters candidates by a
//! degree envelope; the exact haversine test decides.

use std::collections::BTreeMap;

use log::debug;
use rstar::{RTree, RTreeObject, AABB};

use super::track_store::TrackStore;
use crate::config::TrackParams;
use crate::geo_utils::{haversine_distance, search_envelope};
use crate::{StormCell, TrackId};

/// Anchor position a track presents at the sweep's current timestamp.
#[derive(Debug, Clone)]
struct TrackAnchor {
    track_id: TrackId,
    latitude: f64,
    longitude: f64,
}

impl RTreeObject for TrackAnchor {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.longitude, self.latitude])
    }
}

/// Index of cell indices per distinct timestamp, ascending; cells within
/// a timestamp ordered by cell id (determinism).
pub(crate) fn cells_by_timestamp(cells: &[StormCell]) -> BTreeMap<i64, Vec<usize>> {
    let mut by_time: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
    for (idx, cell) in cells.iter().enumerate() {
        by_time.entry(cell.timestamp).or_default().push(idx);
    }
    for indices in by_time.values_mut() {
        indices.sort_by(|&a, &b| cells[a].id.cmp(&cells[b].id));
    }
    by_time
}

/// One full association sweep over every timestamp.
///
/// With `seeding` set, unmatched cells create new single-cell tracks;
/// otherwise every cell is already owned and only moves are possible.
/// Returns the number of assignments that changed.
pub(crate) fn association_sweep(
    store: &mut TrackStore,
    cells: &[StormCell],
    by_time: &BTreeMap<i64, Vec<usize>>,
    params: &TrackParams,
    seeding: bool,
) -> usize {
    let buffer_m = params.buffer_distance_m();
    let buffer_s = params.buffer_time_s();
    let mut changes = 0;

    for (&timestamp, cell_indices) in by_time {
        // Anchors reflect the state accepted at earlier timestamps.
        let anchors: Vec<TrackAnchor> = store
            .tracks()
            .map(|track| {
                let (latitude, longitude) = track.anchor_position(timestamp, cells);
                TrackAnchor {
                    track_id: track.id,
                    latitude,
                    longitude,
                }
            })
            .collect();
        let rtree = RTree::bulk_load(anchors);

        for &cell_idx in cell_indices {
            let cell = &cells[cell_idx];
            let current = store.owner_of(cell_idx);

            let (min_lat, min_lon, max_lat, max_lon) =
                search_envelope(cell.latitude, cell.longitude, buffer_m);
            let envelope = AABB::from_corners([min_lon, min_lat], [max_lon, max_lat]);

            // Candidate set: R-tree hits plus the current owner (whose
            // anchor may sit outside the envelope after membership moves).
            let mut candidate_ids: Vec<TrackId> = rtree
                .locate_in_envelope_intersecting(&envelope)
                .map(|a| a.track_id)
                .collect();
            if let Some(owner) = current {
                candidate_ids.push(owner);
            }
            candidate_ids.sort_unstable();
            candidate_ids.dedup();

            let mut best: Option<(f64, TrackId)> = None;
            for track_id in candidate_ids {
                let Some(distance) =
                    candidate_distance(store, track_id, cell_idx, cells, buffer_m, buffer_s)
                else {
                    continue;
                };
                // Nearest wins; exact distance ties go to the smaller id.
                let better = match best {
                    None => true,
                    Some((best_d, best_id)) => {
                        distance < best_d || (distance == best_d && track_id < best_id)
                    }
                };
                if better {
                    best = Some((distance, track_id));
                }
            }

            match (best, current) {
                (Some((_, winner)), Some(owner)) => {
                    if winner != owner {
                        store.move_cell(cell_idx, winner, cells);
                        changes += 1;
                    }
                }
                (Some((_, winner)), None) => {
                    store.assign(cell_idx, winner, cells);
                    changes += 1;
                }
                (None, None) => {
                    if seeding {
                        store.create_track(cell_idx);
                        changes += 1;
                    }
                }
                // No eligible track: the cell keeps its current one.
                (None, Some(_)) => {}
            }
        }
    }

    debug!(
        "association sweep: {} changes across {} timestamps ({} tracks)",
        changes,
        by_time.len(),
        store.len()
    );
    changes
}

/// Distance from the cell to the track's anchor at the cell's timestamp,
/// if the track is eligible to hold the cell: inside both buffers, no
/// other member at this timestamp, and not a track whose only evidence is
/// the cell itself.
fn candidate_distance(
    store: &TrackStore,
    track_id: TrackId,
    cell_idx: usize,
    cells: &[StormCell],
    buffer_m: f64,
    buffer_s: f64,
) -> Option<f64> {
    let track = store.get(track_id)?;
    let cell = &cells[cell_idx];
    let is_member = store.owner_of(cell_idx) == Some(track_id);
    let exclude = if is_member { Some(cell_idx) } else { None };

    // A cell cannot vouch for itself: a singleton track made of this very
    // cell offers no independent evidence.
    let gap = track.nearest_gap(cell.timestamp, exclude, cells)?;
    if gap as f64 > buffer_s {
        return None;
    }
    if track.occupies_timestamp(cell.timestamp, exclude, cells) {
        return None;
    }

    let (anchor_lat, anchor_lon) = if is_member {
        // Re-evaluating a member: keep the fitted model as anchor, but a
        // memberless fallback would be the cell itself, so reject that.
        match track.model {
            Some(model) => model.predict(cell.timestamp),
            None => return None,
        }
    } else {
        track.anchor_position(cell.timestamp, cells)
    };

    let distance = haversine_distance(cell.latitude, cell.longitude, anchor_lat, anchor_lon);
    (distance <= buffer_m).then_some(distance)
}
