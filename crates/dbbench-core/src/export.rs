//! Durable exports.
//!
//! Raw results go to CSV, one row per result in production order. The
//! summary tree goes to JSON keyed by operation then database. Files are
//! written to a temporary sibling and renamed into place, so a failed export
//! never leaves a partial file behind.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::analyzer::Analyzer;
use crate::error::ExportError;
use crate::result::{BenchmarkResult, COLUMNS, REQUIRED_COLUMNS, SCHEMA_VERSION};
use crate::summary::SummaryTree;

/// File name of the raw results export inside an output directory.
pub const RESULTS_FILE: &str = "benchmark_results.csv";

/// File name of the summary export inside an output directory.
pub const SUMMARY_FILE: &str = "summary.json";

/// Paths written by [`export_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub results: PathBuf,
    pub summary: PathBuf,
    /// Record layout version the files were written with.
    pub schema_version: u32,
}

// -------------------------------------------------------------------------
// Row export
// -------------------------------------------------------------------------

/// Write results as CSV. The header is always written, even for no rows.
pub fn write_csv<W: Write>(writer: W, results: &[BenchmarkResult]) -> Result<(), ExportError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    wtr.write_record(COLUMNS)?;
    for result in results {
        wtr.serialize(result)?;
    }
    wtr.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// Parse a CSV export back into validated results.
///
/// The header must name every required column; `error` may be absent.
/// Columns are matched by name, so their order does not matter.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<BenchmarkResult>, ExportError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(ExportError::MissingColumn(column.to_string()));
        }
    }

    let mut results = Vec::new();
    for (i, row) in rdr.deserialize::<BenchmarkResult>().enumerate() {
        match row {
            Ok(result) => results.push(result),
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                return Err(ExportError::InvalidRow {
                    row: i + 1,
                    message: e.to_string(),
                })
            }
        }
    }

    Ok(results)
}

/// Write results to a CSV file atomically.
pub fn export_csv(path: impl AsRef<Path>, results: &[BenchmarkResult]) -> Result<(), ExportError> {
    let path = path.as_ref();
    write_atomically(path, |w| write_csv(w, results))?;
    debug!(path = %path.display(), rows = results.len(), "results exported");
    Ok(())
}

/// Read results from a CSV file.
pub fn import_csv(path: impl AsRef<Path>) -> Result<Vec<BenchmarkResult>, ExportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ExportError::io(path, e))?;
    read_csv(BufReader::new(file))
}

// -------------------------------------------------------------------------
// Summary export
// -------------------------------------------------------------------------

/// Write the summary tree as pretty-printed JSON.
pub fn write_summary_json<W: Write>(writer: W, tree: &SummaryTree) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, tree)?;
    Ok(())
}

/// Parse a summary JSON document, keeping its key order.
pub fn read_summary_json<R: Read>(reader: R) -> Result<SummaryTree, ExportError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Write the summary tree to a JSON file atomically.
pub fn export_summary(path: impl AsRef<Path>, tree: &SummaryTree) -> Result<(), ExportError> {
    let path = path.as_ref();
    write_atomically(path, |w| write_summary_json(w, tree))?;
    debug!(path = %path.display(), operations = tree.len(), "summary exported");
    Ok(())
}

/// Read a summary tree from a JSON file.
pub fn import_summary(path: impl AsRef<Path>) -> Result<SummaryTree, ExportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ExportError::io(path, e))?;
    read_summary_json(BufReader::new(file))
}

/// Write both exports into an existing directory.
pub fn export_all(dir: impl AsRef<Path>, analyzer: &Analyzer) -> Result<ExportPaths, ExportError> {
    let dir = dir.as_ref();
    let paths = ExportPaths {
        results: dir.join(RESULTS_FILE),
        summary: dir.join(SUMMARY_FILE),
        schema_version: SCHEMA_VERSION,
    };

    export_csv(&paths.results, analyzer.results())?;
    export_summary(&paths.summary, &analyzer.summary_statistics())?;

    info!(
        dir = %dir.display(),
        results = analyzer.len(),
        schema_version = SCHEMA_VERSION,
        "exports written"
    );
    Ok(paths)
}

/// Write through a temporary file in the destination directory, then rename.
///
/// The temporary file is removed on every error path.
fn write_atomically<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<(), ExportError>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ExportError::io(dir, e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        write(&mut writer)?;
        writer.flush().map_err(|e| ExportError::io(path, e))?;
    }
    tmp.as_file()
        .sync_all()
        .map_err(|e| ExportError::io(path, e))?;
    tmp.persist(path)
        .map_err(|e| ExportError::io(path, e.error))?;

    Ok(())
}
