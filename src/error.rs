//! Unified error handling for the stormtrack crate.
//!
//! Configuration and input-availability problems are surfaced as
//! [`StormTrackError`] values before the engine runs. Algorithmic edge
//! cases (unfit trajectory, no eligible track for a cell) are handled
//! internally by the engine and never appear here.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ParamViolation;

/// Result type alias using [`StormTrackError`].
pub type Result<T> = std::result::Result<T, StormTrackError>;

/// Errors produced by configuration, ingestion, and output stages.
#[derive(Debug, Error)]
pub enum StormTrackError {
    /// One or more parameters fell outside their valid range.
    #[error("invalid parameters: {}", format_violations(.0))]
    InvalidParams(Vec<ParamViolation>),

    /// A time-window bound could not be parsed at any supported granularity.
    #[error(
        "unrecognized time bound {value:?} (expected YYYY, YYYY-MM, YYYY-MM-DD, \
         or an RFC 3339 timestamp)"
    )]
    BadTimeBound { value: String },

    /// The detection input directory does not exist.
    #[error(
        "input path {path:?} not found; relative paths resolve against \
         the current working directory"
    )]
    MissingInput { path: PathBuf },

    /// The parameter file is missing or not valid JSON.
    #[error("cannot read parameter file {path:?}: {reason}")]
    CorruptConfig { path: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_violations(violations: &[ParamViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
