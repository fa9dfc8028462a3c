//! hamprep-logbook: contact-log import and export.
//!
//! Two exchange formats are supported: a versioned JSON envelope and a
//! fixed-column CSV file. Imports are lenient per entry; exports replace
//! the target file atomically.

pub mod csv_io;
pub mod error;
pub mod json_io;
pub mod model;

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

pub use csv_io::{read_csv, write_csv};
pub use error::{LogbookError, Result};
pub use json_io::{from_json_str, to_json_string};
pub use model::{ContactLog, ImportSummary, CSV_COLUMNS, FORMAT_VERSION};

/// Export logs to a JSON envelope file.
pub fn export_json(path: &Path, logs: &[ContactLog]) -> Result<()> {
    let json = to_json_string(logs)?;
    write_atomic(path, |file| Ok(file.write_all(json.as_bytes())?))?;
    tracing::info!(count = logs.len(), path = %path.display(), "exported logbook as JSON");
    Ok(())
}

/// Import logs from a JSON envelope file.
pub fn import_json(path: &Path) -> Result<ImportSummary> {
    let content = std::fs::read_to_string(path)?;
    let summary = from_json_str(&content)?;
    log_import(path, &summary);
    Ok(summary)
}

/// Export logs to a CSV file.
pub fn export_csv(path: &Path, logs: &[ContactLog]) -> Result<()> {
    write_atomic(path, |file| write_csv(file, logs))?;
    tracing::info!(count = logs.len(), path = %path.display(), "exported logbook as CSV");
    Ok(())
}

/// Import logs from a CSV file.
pub fn import_csv(path: &Path) -> Result<ImportSummary> {
    let file = File::open(path)?;
    let summary = read_csv(BufReader::new(file))?;
    log_import(path, &summary);
    Ok(summary)
}

fn log_import(path: &Path, summary: &ImportSummary) {
    tracing::info!(
        imported = summary.imported(),
        skipped = summary.skipped,
        path = %path.display(),
        "imported logbook"
    );
}

/// Write through a temp file in the target directory, then rename into place.
fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    write(tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| LogbookError::Io(e.error))?;
    Ok(())
}
