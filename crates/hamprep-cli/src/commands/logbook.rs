//! The `hamprep logbook` commands.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;

use hamprep_logbook::{ContactLog, ImportSummary};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Format {
    Json,
    Csv,
}

fn stored_logs(path: &Path) -> Result<Vec<ContactLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let summary = hamprep_logbook::import_json(path)
        .with_context(|| format!("failed to read logbook: {}", path.display()))?;
    Ok(summary.logs)
}

pub fn export(format: Format, file: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = hamprep_store::load_config_from(config_path.as_deref())?;
    let logs = stored_logs(&config.logbook_path())?;

    let written = match format {
        Format::Json => hamprep_logbook::export_json(&file, &logs),
        Format::Csv => hamprep_logbook::export_csv(&file, &logs),
    };
    written.with_context(|| format!("failed to export to {}", file.display()))?;

    println!("Exported {} contact(s) to {}", logs.len(), file.display());
    Ok(())
}

pub fn import(format: Format, file: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = hamprep_store::load_config_from(config_path.as_deref())?;
    let logbook = config.logbook_path();

    let ImportSummary { logs, skipped } = match format {
        Format::Json => hamprep_logbook::import_json(&file),
        Format::Csv => hamprep_logbook::import_csv(&file),
    }
    .with_context(|| format!("failed to import {}", file.display()))?;

    let mut stored = stored_logs(&logbook)?;
    let imported = logs.len();
    stored.extend(logs);
    hamprep_logbook::export_json(&logbook, &stored)
        .with_context(|| format!("failed to write logbook: {}", logbook.display()))?;

    println!("Imported {imported} contact(s), skipped {skipped}.");
    println!("Logbook now holds {} contact(s).", stored.len());
    Ok(())
}
