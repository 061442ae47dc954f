//! Breakup pass: split tracks that no longer fit one motion model.
//!
//! A track of three or more members is re-checked against its own fitted
//! trajectory; the residual at each member is the distance between the
//! observed and the model-predicted position at that member's timestamp.
//! The track splits at the first member whose residual exceeds
//! buffer_distance, leaving a re-fit prefix and an independent open
//! suffix that later passes may re-associate or join.

use log::debug;

use super::track_store::TrackStore;
use crate::config::TrackParams;
use crate::geo_utils::haversine_distance;
use crate::StormCell;

/// One breakup sweep over all tracks. Returns the number of splits.
pub(crate) fn breakup_pass(
    store: &mut TrackStore,
    cells: &[StormCell],
    params: &TrackParams,
) -> usize {
    let buffer_m = params.buffer_distance_m();
    let mut splits = 0;

    // Snapshot ids: children created here are examined next iteration.
    for track_id in store.track_ids() {
        let Some(split_at) = first_inconsistent_member(store, track_id, cells, buffer_m) else {
            continue;
        };
        store.split_track(track_id, split_at, cells);
        splits += 1;
    }

    if splits > 0 {
        debug!("breakup pass: {splits} tracks split");
    }
    splits
}

/// Member position of the first residual-tolerance violation, if the
/// track qualifies for splitting. Index 0 never splits: with the whole
/// prefix inconsistent there is no coherent head to keep, and the next
/// re-fit already absorbs it.
fn first_inconsistent_member(
    store: &TrackStore,
    track_id: crate::TrackId,
    cells: &[StormCell],
    buffer_m: f64,
) -> Option<usize> {
    let track = store.track(track_id);
    if track.cells.len() < 3 {
        return None;
    }
    let model = track.model?;

    track.cells.iter().enumerate().skip(1).find_map(|(pos, &idx)| {
        let cell = &cells[idx];
        let (pred_lat, pred_lon) = model.predict(cell.timestamp);
        let residual =
            haversine_distance(cell.latitude, cell.longitude, pred_lat, pred_lon);
        (residual > buffer_m).then_some(pos)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::track_store::TrackStore;
    use crate::StormCell;

    /// A track heading north that turns east halfway, far enough that a
    /// single line cannot describe it within the buffer.
    fn dog_leg() -> Vec<StormCell> {
        let mut cells = Vec::new();
        for i in 0..12 {
            let id = format!("n{i:02}");
            cells.push(StormCell::new(&id, 35.0 + 0.08 * i as f64, -97.0, i as i64 * 300));
        }
        for i in 0..12 {
            let id = format!("e{i:02}");
            cells.push(StormCell::new(
                &id,
                35.0 + 0.08 * 11.0,
                -97.0 + 0.08 * (i + 1) as f64,
                (12 + i) as i64 * 300,
            ));
        }
        cells
    }

    fn max_residual(store: &TrackStore, cells: &[StormCell]) -> f64 {
        store
            .tracks()
            .filter_map(|track| {
                let model = track.model?;
                track
                    .cells
                    .iter()
                    .map(|&idx| {
                        let c = &cells[idx];
                        let (lat, lon) = model.predict(c.timestamp);
                        haversine_distance(c.latitude, c.longitude, lat, lon)
                    })
                    .max_by(f64::total_cmp)
            })
            .max_by(f64::total_cmp)
            .unwrap_or(0.0)
    }

    #[test]
    fn split_reduces_max_residual() {
        let cells = dog_leg();
        let mut store = TrackStore::new(cells.len());
        let first = store.create_track(0);
        for idx in 1..cells.len() {
            store.assign(idx, first, &cells);
        }
        store.refit_all(&cells);

        let params = crate::TrackParams::default();
        let before = max_residual(&store, &cells);
        assert!(
            before > params.buffer_distance_m(),
            "fixture must violate the residual tolerance (got {before} m)"
        );

        let splits = breakup_pass(&mut store, &cells, &params);
        assert!(splits >= 1);
        assert!(store.len() >= 2);

        let after = max_residual(&store, &cells);
        assert!(
            after <= before,
            "splitting must not increase the max residual ({after} > {before})"
        );
    }

    #[test]
    fn consistent_track_never_splits() {
        let cells: Vec<StormCell> = (0..6)
            .map(|i| {
                let id = format!("c{i}");
                StormCell::new(&id, 35.0 + 0.01 * i as f64, -97.0, i as i64 * 300)
            })
            .collect();
        let mut store = TrackStore::new(cells.len());
        let track = store.create_track(0);
        for idx in 1..cells.len() {
            store.assign(idx, track, &cells);
        }
        store.refit_all(&cells);

        let splits = breakup_pass(&mut store, &cells, &crate::TrackParams::default());
        assert_eq!(splits, 0);
        assert_eq!(store.len(), 1);
    }
}
