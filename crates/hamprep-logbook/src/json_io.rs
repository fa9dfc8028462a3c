//! JSON envelope encoding.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{LogbookError, Result};
use crate::model::{ContactLog, ImportSummary, LogEnvelope, FORMAT_VERSION};

/// Lenient view of an envelope; entries are decoded one at a time.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEnvelope {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    logs: Vec<Value>,
}

fn default_version() -> u32 {
    FORMAT_VERSION
}

/// Encode logs as a pretty-printed envelope stamped with the current time.
pub fn to_json_string(logs: &[ContactLog]) -> Result<String> {
    Ok(serde_json::to_string_pretty(&LogEnvelope::new(logs))?)
}

/// Decode an envelope. Entries that do not match the log schema are skipped.
pub fn from_json_str(content: &str) -> Result<ImportSummary> {
    let raw: RawEnvelope = serde_json::from_str(content)?;
    if raw.version > FORMAT_VERSION {
        return Err(LogbookError::UnsupportedVersion(raw.version));
    }

    let mut summary = ImportSummary::default();
    for (index, entry) in raw.logs.into_iter().enumerate() {
        match serde_json::from_value::<ContactLog>(entry) {
            Ok(log) => summary.logs.push(log),
            Err(e) => {
                tracing::warn!(index, "skipping malformed log entry: {e}");
                summary.skipped += 1;
            }
        }
    }
    Ok(summary)
}
