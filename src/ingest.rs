//! Ingestion contract types.
//!
//! Format-specific adapters live outside the engine; they hand over a
//! normalized [`CellBatch`] for a requested [`TimeWindow`]. The window
//! accepts bounds at year, month, day, or full-timestamp granularity.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::error::{Result, StormTrackError};
use crate::StormCell;

/// Half-open time window `[start, end)` in unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    /// Parse a window from two bound strings. Each bound may be `YYYY`,
    /// `YYYY-MM`, `YYYY-MM-DD`, or an RFC 3339 timestamp; the start
    /// rounds down to the beginning of its granule and the end rounds up
    /// past the end of its granule.
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Ok(Self {
            start: parse_bound(start, false)?,
            end: parse_bound(end, true)?,
        })
    }

    /// A window covering all representable time.
    pub fn unbounded() -> Self {
        Self {
            start: i64::MIN,
            end: i64::MAX,
        }
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

fn parse_bound(value: &str, round_up: bool) -> Result<i64> {
    let bad = || StormTrackError::BadTimeBound {
        value: value.to_string(),
    };

    let start_of = match value.len() {
        4 => {
            let year: i32 = value.parse().map_err(|_| bad())?;
            let date = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(bad)?;
            if round_up {
                NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(bad)?
            } else {
                date
            }
        }
        7 => {
            let date =
                NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").map_err(|_| bad())?;
            if round_up {
                next_month(date).ok_or_else(bad)?
            } else {
                date
            }
        }
        10 => {
            let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| bad())?;
            if round_up {
                date.succ_opt().ok_or_else(bad)?
            } else {
                date
            }
        }
        _ => {
            // Full timestamp: exact bound on both ends.
            let ts = DateTime::parse_from_rfc3339(value).map_err(|_| bad())?;
            return Ok(ts.timestamp());
        }
    };

    Ok(start_of.and_hms_opt(0, 0, 0).ok_or_else(bad)?.and_utc().timestamp())
}

fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    }
}

/// Normalized output of an ingestion adapter: the cells inside the
/// requested window, the number of distinct source files they came from,
/// and the set of observed dates.
#[derive(Debug, Clone, Default)]
pub struct CellBatch {
    pub cells: Vec<StormCell>,
    pub file_count: usize,
    pub dates: BTreeSet<NaiveDate>,
}

impl CellBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absorb one source file's worth of cells, filtered by `window`.
    pub fn push_file(&mut self, cells: impl IntoIterator<Item = StormCell>, window: &TimeWindow) {
        self.file_count += 1;
        for cell in cells {
            if !window.contains(cell.timestamp) {
                continue;
            }
            if let Some(date) = DateTime::<Utc>::from_timestamp(cell.timestamp, 0) {
                self.dates.insert(date.date_naive());
            }
            self.cells.push(cell);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
