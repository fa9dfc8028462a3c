use thiserror::Error;

/// Errors raised while reading or writing a logbook.
#[derive(Debug, Error)]
pub enum LogbookError {
    #[error("logbook I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The CSV header row lacks a required column.
    #[error("CSV header is missing column `{0}`")]
    MissingColumn(&'static str),

    /// The JSON envelope was written by a newer format.
    #[error("unsupported logbook version {0}")]
    UnsupportedVersion(u32),
}

pub type Result<T, E = LogbookError> = std::result::Result<T, E>;
