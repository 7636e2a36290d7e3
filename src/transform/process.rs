// src/transform/process.rs

use anyhow::{Context, Result};
use csv::QuoteStyle;
use std::{
    fs::{self, File},
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

use super::{chunk::BatchReader, clean};
use crate::config::Config;
use crate::schema::{self, TableSchema};

/// Terminal state of one raw file.
#[derive(Debug)]
pub enum FileOutcome {
    /// Fully processed; the source file was consumed (deleted).
    Transformed(PathBuf),
    /// Filename matched no known table; the file was left untouched.
    Skipped,
    /// An I/O or parse error aborted this file. The source is kept for
    /// investigation and the run continues with the next file.
    Failed,
}

/// Transform one raw file into its loader-ready output.
///
/// Per-file isolation: every error below the orchestrator is absorbed here,
/// so one corrupt file cannot abort the whole period's run.
pub fn process_file(config: &Config, path: &Path, out_dir: &Path) -> FileOutcome {
    info!(path = %path.display(), "processing");

    let Some(table) = schema::resolve_table(path) else {
        warn!(path = %path.display(), "could not determine table, skipping");
        return FileOutcome::Skipped;
    };
    let out_path = output_path(path, table.name, out_dir);

    let result = stream_file(config, path, table, &out_path).and_then(|_| {
        // Consuming semantics: a fully processed source is removed so a
        // rerun starts from the stale-output purge, not from double input.
        fs::remove_file(path).with_context(|| format!("removing source {}", path.display()))
    });

    match result {
        Ok(()) => {
            info!(path = %path.display(), output = %out_path.display(), "finished and removed source");
            FileOutcome::Transformed(out_path)
        }
        Err(e) => {
            error!(path = %path.display(), "processing failed: {e:#}");
            FileOutcome::Failed
        }
    }
}

/// Derive the output path: `<table>[_<digits>].csv` under `out_dir`, where
/// the digits come from the part of the source basename before its first
/// underscore (multi-part tables keep their sequence suffix).
pub fn output_path(source: &Path, table: &str, out_dir: &Path) -> PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let digits: String = base
        .split('_')
        .next()
        .unwrap_or("")
        .chars()
        .filter(char::is_ascii_digit)
        .collect();

    let file_name = if digits.is_empty() {
        format!("{table}.csv")
    } else {
        format!("{table}_{digits}.csv")
    };
    out_dir.join(file_name)
}

fn stream_file(
    config: &Config,
    path: &Path,
    table: &TableSchema,
    out_path: &Path,
) -> Result<()> {
    let reader = BatchReader::open(path, config.performance.read_chunk_size)?;
    let mut writer: Option<csv::Writer<File>> = None;

    for batch in reader {
        let mut batch = batch?;

        if batch.width != table.width() {
            warn!(
                path = %path.display(),
                table = table.name,
                fields = batch.width,
                expected = table.width(),
                "column count mismatch, discarding chunk"
            );
            continue;
        }

        clean::clean_batch(&mut batch, table, &config.settings);

        // Lazy open so the header lands with the first written chunk and a
        // fully discarded file produces no output at all.
        if writer.is_none() {
            writer = Some(open_output(out_path, table)?);
        }
        if let Some(w) = writer.as_mut() {
            for row in &batch.rows {
                w.write_record(row)
                    .with_context(|| format!("writing to {}", out_path.display()))?;
            }
        }
    }

    if let Some(mut writer) = writer {
        writer
            .flush()
            .with_context(|| format!("flushing {}", out_path.display()))?;
    }
    Ok(())
}

/// UTF-8, semicolon-delimited, everything but numerics quoted. The load
/// stage's bulk statement expects exactly these conventions.
fn open_output(out_path: &Path, table: &TableSchema) -> Result<csv::Writer<File>> {
    let file = File::create(out_path)
        .with_context(|| format!("creating output file {}", out_path.display()))?;
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(file);
    writer
        .write_record(table.column_names())
        .context("writing header")?;
    Ok(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn config() -> Config {
        let mut cfg = Config::default();
        cfg.performance.read_chunk_size = 2;
        cfg
    }

    fn write_file(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(bytes).unwrap();
        path
    }

    #[test]
    fn output_path_keeps_the_numeric_suffix() {
        let out_dir = Path::new("/out");
        assert_eq!(
            output_path(Path::new("/raw/Empresas.csv"), "empresa", out_dir),
            out_dir.join("empresa.csv")
        );
        assert_eq!(
            output_path(Path::new("/raw/Empresas3.csv"), "empresa", out_dir),
            out_dir.join("empresa_3.csv")
        );
    }

    #[test]
    fn transforms_and_consumes_a_reference_file() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = write_file(
            raw.path(),
            "Paises.csv",
            b"\"105\";\"BRASIL\"\n\"105\";\"BRASIL\"\n\"239\";\"PORTUGAL\"\n\"998\";\"\"\n",
        );

        let outcome = process_file(&config(), &source, out.path());
        let FileOutcome::Transformed(out_path) = outcome else {
            panic!("expected Transformed, got {outcome:?}");
        };

        assert!(!source.exists(), "source must be consumed");
        let text = fs::read_to_string(&out_path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "\"codigo\";\"descricao\"");
        assert!(lines.contains(&"105;\"BRASIL\""));
        assert!(lines.contains(&"998;\"\\N\""));
        // Duplicate within the first chunk collapses to one row.
        assert_eq!(text.matches("BRASIL").count(), 1);
    }

    #[test]
    fn schema_mismatch_discards_every_chunk_but_still_consumes() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        // empresa declares 7 columns; this file carries 5.
        let source = write_file(
            raw.path(),
            "Empresas.csv",
            b"a;b;c;d;e\nf;g;h;i;j\nk;l;m;n;o\n",
        );

        let outcome = process_file(&config(), &source, out.path());
        let FileOutcome::Transformed(out_path) = outcome else {
            panic!("expected Transformed, got {outcome:?}");
        };

        assert!(!source.exists());
        assert!(!out_path.exists(), "no chunk written means no output file");
    }

    #[test]
    fn unresolvable_filename_is_skipped_and_kept() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = write_file(raw.path(), "LAYOUT.txt", b"whatever\n");

        assert!(matches!(
            process_file(&config(), &source, out.path()),
            FileOutcome::Skipped
        ));
        assert!(source.exists());
    }

    #[test]
    fn unreadable_file_fails_without_aborting() {
        let out = TempDir::new().unwrap();
        let missing = Path::new("/definitely/not/here/Empresas.csv");

        assert!(matches!(
            process_file(&config(), missing, out.path()),
            FileOutcome::Failed
        ));
    }

    #[test]
    fn float_column_is_written_unquoted_with_dot_separator() {
        let raw = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        let source = write_file(
            raw.path(),
            "Empresas.csv",
            b"\"123\";\"ACME\";\"2062\";\"49\";\"1234,56\";\"05\";\"\"\n",
        );

        let FileOutcome::Transformed(out_path) = process_file(&config(), &source, out.path())
        else {
            panic!("expected Transformed");
        };

        let text = fs::read_to_string(&out_path).unwrap();
        let data_line = text.lines().nth(1).unwrap();
        assert!(data_line.contains(";1234.56;"), "got: {data_line}");
        assert!(data_line.ends_with("\"\\N\""));
    }
}
