//! Fixed-column CSV encoding.

use std::io::{Read, Write};

use crate::error::{LogbookError, Result};
use crate::model::{ContactLog, ImportSummary, CSV_COLUMNS};

/// Write logs with a header row. Missing optional fields become empty cells.
pub fn write_csv<W: Write>(writer: W, logs: &[ContactLog]) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    // Written explicitly so an empty logbook still carries the header.
    writer.write_record(CSV_COLUMNS)?;
    for log in logs {
        writer.serialize(log)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read logs from CSV. Each row is parsed on its own; rows that fail are
/// skipped and counted.
pub fn read_csv<R: Read>(reader: R) -> Result<ImportSummary> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in CSV_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(LogbookError::MissingColumn(column));
        }
    }

    let mut summary = ImportSummary::default();
    for (index, row) in reader.deserialize::<ContactLog>().enumerate() {
        match row {
            Ok(log) => summary.logs.push(log),
            Err(e) => {
                // Line 1 is the header.
                tracing::warn!(line = index + 2, "skipping malformed CSV row: {e}");
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}
