//! The `hamprep validate` command.

use std::path::PathBuf;

use anyhow::Result;

use hamprep_core::bank;
use hamprep_core::model::Level;

pub fn execute(bank_path: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let bank_path = match bank_path {
        Some(path) => path,
        None => hamprep_store::load_config_from(config_path.as_deref())?.question_bank_path(),
    };
    let questions = bank::load_bank(&bank_path)?;

    let per_level: Vec<String> = Level::ALL
        .iter()
        .map(|level| {
            let n = questions.iter().filter(|q| q.level == *level).count();
            format!("{level}: {n}")
        })
        .collect();
    println!(
        "Question bank: {} ({} questions; {})",
        bank_path.display(),
        questions.len(),
        per_level.join(", ")
    );

    let warnings = bank::validate_bank(&questions);
    for w in &warnings {
        let prefix = w
            .question_id
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("All questions valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
