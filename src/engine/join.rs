//! Join pass: merge spatiotemporally compatible tracks.
//!
//! Two tracks join when one ends within join_time before the other
//! begins, their facing endpoints sit within join_distance, and the
//! earlier track's trajectory extrapolates to the later track's first
//! observation within a buffer-distance envelope scaled by the gap. Join
//! buffers are looser than association buffers so missed detections can
//! be bridged. Compatibility is transitive within one pass: pairs are
//! grouped with Union-Find so chains collapse into a single track.

use log::debug;

use super::track_store::TrackStore;
use crate::config::TrackParams;
use crate::geo_utils::haversine_distance;
use crate::union_find::UnionFind;
use crate::{StormCell, TrackId};

/// Endpoint summary used for pairwise compatibility checks.
struct Endpoints {
    id: TrackId,
    first_ts: i64,
    last_ts: i64,
    first_pos: (f64, f64),
    last_pos: (f64, f64),
}

/// One join sweep. Returns the number of tracks absorbed into others.
pub(crate) fn join_pass(
    store: &mut TrackStore,
    cells: &[StormCell],
    params: &TrackParams,
) -> usize {
    let endpoints: Vec<Endpoints> = {
        let mut eps: Vec<Endpoints> = store
            .tracks()
            .map(|track| {
                let first = &cells[track.cells[0]];
                let last = &cells[*track.cells.last().expect("track is never empty")];
                Endpoints {
                    id: track.id,
                    first_ts: first.timestamp,
                    last_ts: last.timestamp,
                    first_pos: (first.latitude, first.longitude),
                    last_pos: (last.latitude, last.longitude),
                }
            })
            .collect();
        // Sorted by start time so each track only scans the window of
        // tracks that could begin inside its join-time horizon.
        eps.sort_by_key(|e| (e.first_ts, e.id));
        eps
    };

    let mut uf: UnionFind<TrackId> = UnionFind::with_capacity(endpoints.len());
    for ep in &endpoints {
        uf.make_set(ep.id);
    }

    for (i, earlier) in endpoints.iter().enumerate() {
        for later in endpoints[i + 1..].iter() {
            if (later.first_ts - earlier.last_ts) as f64 > params.join_time_s() {
                // Starts only grow from here; no further candidates.
                break;
            }
            if compatible(earlier, later, store, params) {
                uf.union(&earlier.id, &later.id);
            }
        }
    }

    // Merge each group in start-time order; a member that would overlap
    // the accumulated span stays a separate track.
    let mut merged = 0;
    for (_, members) in uf.groups() {
        if members.len() < 2 {
            continue;
        }
        let mut ordered = members;
        ordered.sort_by_key(|&id| (store.track(id).first_timestamp(cells), id));

        let target = ordered[0];
        for &victim in &ordered[1..] {
            let starts_after = store.track(victim).first_timestamp(cells)
                > store.track(target).last_timestamp(cells);
            if starts_after {
                store.absorb(target, victim, cells);
                merged += 1;
            }
        }
    }

    if merged > 0 {
        debug!("join pass: {merged} tracks merged");
    }
    merged
}

/// Pairwise compatibility under the join buffers.
fn compatible(
    earlier: &Endpoints,
    later: &Endpoints,
    store: &TrackStore,
    params: &TrackParams,
) -> bool {
    // Strictly positive gap: merging may never duplicate a timestamp.
    let gap_s = (later.first_ts - earlier.last_ts) as f64;
    if gap_s <= 0.0 || gap_s > params.join_time_s() {
        return false;
    }

    let endpoint_separation = haversine_distance(
        earlier.last_pos.0,
        earlier.last_pos.1,
        later.first_pos.0,
        later.first_pos.1,
    );
    if endpoint_separation > params.join_distance_m() {
        return false;
    }

    // Direction compatibility: the later track's first observation must
    // fall inside the earlier track's extrapolation envelope, which
    // widens with the gap. Unfit (single-cell) tracks have no direction
    // to contradict, so the endpoint check stands alone.
    match store.track(earlier.id).model {
        Some(model) => {
            let (pred_lat, pred_lon) = model.predict(later.first_ts);
            let deviation =
                haversine_distance(later.first_pos.0, later.first_pos.1, pred_lat, pred_lon);
            let envelope = params.buffer_distance_m() * (1.0 + gap_s / params.buffer_time_s());
            deviation <= envelope
        }
        None => true,
    }
}
