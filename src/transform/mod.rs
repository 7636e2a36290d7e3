// src/transform/mod.rs

pub mod chunk;
pub mod clean;
pub mod coerce;
pub mod process;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use glob::glob;
use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::config::Config;
use crate::schema;
use process::{output_path, process_file, FileOutcome};

/// Transform every raw file of one period into loader-ready CSVs.
///
/// With an explicit `csv_files` list the period is taken from the first
/// path's parent directory. With an empty list the most recent period under
/// `extract_path` is discovered (or selected interactively when `ask_user`
/// is set). Zero available periods is the only hard error; every per-file
/// problem is logged and the run continues.
pub fn transform_data(config: &Config, csv_files: Vec<PathBuf>) -> Result<Vec<PathBuf>> {
    let (period, csv_files) = if csv_files.is_empty() {
        let periods = available_periods(&config.paths.extract_path)?;
        if periods.is_empty() {
            bail!(
                "no extracted periods available under {}",
                config.paths.extract_path.display()
            );
        }
        let period = if config.settings.ask_user {
            ask_period(&periods)?
        } else {
            periods[0].clone()
        };
        let files = period_files(&config.paths.extract_path.join(&period))?;
        (period, files)
    } else {
        let period = period_of(&csv_files[0])?;
        (period, csv_files)
    };

    let out_dir = config.paths.transformed_path.join(&period);
    fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    // Delete-and-regenerate: leftovers from an earlier (possibly partial)
    // run must not receive appends from this one.
    remove_stale_outputs(&csv_files, &out_dir);

    let mut outputs = Vec::new();
    for path in &csv_files {
        match process_file(config, path, &out_dir) {
            FileOutcome::Transformed(out) => {
                info!(output = %out.display(), "created");
                outputs.push(out);
            }
            FileOutcome::Skipped | FileOutcome::Failed => {}
        }
    }

    info!(period = %period, files = outputs.len(), "transformation completed");
    Ok(outputs)
}

/// Period directories under the extraction root, newest first.
fn available_periods(extract_root: &Path) -> Result<Vec<String>> {
    let pattern = format!("{}/*", extract_root.display());
    let mut periods: Vec<String> = glob(&pattern)
        .context("listing extraction root")?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_dir())
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
        .filter(|name| is_period(name))
        .collect();
    periods.sort();
    periods.reverse();
    Ok(periods)
}

/// A period directory is named `YYYY-MM` (zero-padded).
fn is_period(name: &str) -> bool {
    name.len() == 7 && NaiveDate::parse_from_str(&format!("{name}-01"), "%Y-%m-%d").is_ok()
}

fn period_files(period_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!("{}/*", period_dir.display());
    let mut files: Vec<PathBuf> = glob(&pattern)
        .with_context(|| format!("listing period directory {}", period_dir.display()))?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Derive the owning period from a raw file path (its parent directory name).
fn period_of(path: &Path) -> Result<String> {
    path.parent()
        .and_then(Path::file_name)
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("cannot derive period from {}", path.display()))
}

/// Purge outputs left over from a previous run of the same period.
fn remove_stale_outputs(csv_files: &[PathBuf], out_dir: &Path) {
    for path in csv_files {
        let Some(table) = schema::resolve_table(path) else {
            warn!(path = %path.display(), "could not determine table, skipping stale check");
            continue;
        };
        let out_path = output_path(path, table.name, out_dir);
        if out_path.exists() {
            match fs::remove_file(&out_path) {
                Ok(()) => info!(path = %out_path.display(), "deleted stale output"),
                Err(e) => warn!(path = %out_path.display(), "could not delete stale output: {e}"),
            }
        }
    }
}

/// Numbered prompt for the period to process. Anything unparsable or out of
/// range falls back to the most recent period.
fn ask_period(periods: &[String]) -> Result<String> {
    let mut stdout = io::stdout();
    for (idx, period) in periods.iter().enumerate() {
        writeln!(stdout, "{}. {}", idx + 1, period)?;
    }
    write!(stdout, "Period to transform [1]: ")?;
    stdout.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let choice = line.trim().parse::<usize>().unwrap_or(1);
    let idx = choice.saturating_sub(1).min(periods.len() - 1);
    Ok(periods[idx].clone())
}
