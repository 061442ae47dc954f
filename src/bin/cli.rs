//! stormtrack CLI - run the best-track engine over detection CSV files
//!
//! Usage:
//!   stormtrack-cli track <folder> [--output <dir>] [--params <file>]
//!                                 [--start <bound> --end <bound>]
//!   stormtrack-cli synth <file> [--storms N] [--scans N] [--seed N]
//!
//! `track` ingests normalized detection CSV files (columns: id, latitude,
//! longitude, timestamp, source) and writes the final assignment map plus
//! per-track trajectory models as JSON - one aggregate file, or one file
//! per time step with `per_timestep_output` set in the parameter file.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{info, warn};

use stormtrack::{
    run_tracking, CellBatch, Result, StormCell, StormTrackError, TimeWindow, TrackParams,
    TrackingResult,
};

#[derive(Parser)]
#[command(name = "stormtrack-cli")]
#[command(about = "Storm-cell best-track association", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Associate detections from CSV files into best tracks
    Track {
        /// Folder containing detection CSV files
        folder: PathBuf,

        /// Output directory for results (created if absent)
        #[arg(short, long, default_value = "tracks_out")]
        output: PathBuf,

        /// JSON parameter file (defaults apply when omitted)
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Window start: YYYY, YYYY-MM, YYYY-MM-DD, or RFC 3339
        #[arg(long, requires = "end")]
        start: Option<String>,

        /// Window end, same granularities as --start
        #[arg(long, requires = "start")]
        end: Option<String>,
    },

    /// Generate a synthetic detection CSV for testing
    #[cfg(feature = "synthetic")]
    Synth {
        /// Output CSV path
        file: PathBuf,

        /// Number of storms
        #[arg(long, default_value = "20")]
        storms: usize,

        /// Detections per storm
        #[arg(long, default_value = "12")]
        scans: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Track {
            folder,
            output,
            params,
            start,
            end,
        } => run_track(&folder, &output, params.as_deref(), start.as_deref(), end.as_deref()),
        #[cfg(feature = "synthetic")]
        Commands::Synth {
            file,
            storms,
            scans,
            seed,
        } => run_synth(&file, storms, scans, seed),
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run_track(
    folder: &Path,
    output: &Path,
    params_path: Option<&Path>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    // All fatal checks happen here, before the engine runs.
    let params = match params_path {
        Some(path) => TrackParams::from_json_file(path)?,
        None => TrackParams::default(),
    };
    let params = params.validated()?;

    // clap enforces that --start and --end appear together.
    let window = match (start, end) {
        (Some(s), Some(e)) => TimeWindow::parse(s, e)?,
        _ => TimeWindow::unbounded(),
    };

    if !folder.is_dir() {
        return Err(StormTrackError::MissingInput {
            path: folder.to_path_buf(),
        });
    }

    let batch = ingest_folder(folder, &window)?;
    if batch.file_count == 0 {
        info!("no detection files matched the requested window; nothing to do");
        return Ok(());
    }
    info!(
        "ingested {} cells from {} files across {} dates",
        batch.cells.len(),
        batch.file_count,
        batch.dates.len()
    );
    if batch.is_empty() {
        info!("all cells fell outside the requested window; nothing to do");
        return Ok(());
    }

    let per_timestep = params.per_timestep_output;
    let result = run_tracking(batch.cells, &params);

    fs::create_dir_all(output)?;
    if per_timestep {
        write_per_timestep(output, &result)?;
    } else {
        write_aggregate(&output.join("tracks.json"), &result)?;
    }
    info!(
        "{} tracks written to {:?} ({} splits, {} merges, {} tracks dropped)",
        result.stats.track_count,
        output,
        result.stats.splits,
        result.stats.merges,
        result.stats.dropped_tracks
    );
    Ok(())
}

/// Read every `.csv` file in the folder (sorted by name) into one batch.
fn ingest_folder(folder: &Path, window: &TimeWindow) -> Result<CellBatch> {
    let mut paths: Vec<PathBuf> = fs::read_dir(folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().map_or(false, |ext| ext == "csv"))
        .collect();
    paths.sort();

    let mut batch = CellBatch::new();
    for path in paths {
        let mut reader = csv::Reader::from_path(&path)?;
        let mut cells = Vec::new();
        for record in reader.deserialize::<StormCell>() {
            let cell = record?;
            if cell.is_valid() {
                cells.push(cell);
            } else {
                warn!("skipping cell {} with invalid position in {:?}", cell.id, path);
            }
        }
        batch.push_file(cells, window);
    }
    Ok(batch)
}

fn write_aggregate(path: &Path, result: &TrackingResult) -> Result<()> {
    let file = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(file, result)?;
    Ok(())
}

/// One JSON artifact per distinct member timestamp, each holding the
/// cell-to-track assignments active at that time step together with the
/// owning tracks and their trajectory models.
fn write_per_timestep(output: &Path, result: &TrackingResult) -> Result<()> {
    for (ts, snapshot) in result.per_timestep() {
        let path = output.join(format!("assignments_{ts}.json"));
        let file = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(file, &snapshot)?;
    }
    Ok(())
}

#[cfg(feature = "synthetic")]
fn run_synth(file: &Path, storms: usize, scans: usize, seed: u64) -> Result<()> {
    let scenario = stormtrack::synthetic::StormScenario {
        storm_count: storms,
        scans_per_storm: scans,
        seed,
        ..Default::default()
    };
    let dataset = scenario.generate();

    if let Some(parent) = file.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut writer = csv::Writer::from_path(file)?;
    for cell in &dataset.cells {
        writer.serialize(cell)?;
    }
    writer.flush()?;
    info!("wrote {} synthetic cells to {:?}", dataset.cells.len(), file);
    Ok(())
}
