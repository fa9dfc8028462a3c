//! The `hamprep exam` commands.

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Table};
use serde::{Deserialize, Serialize};

use hamprep_core::answer::split_labels;
use hamprep_core::model::{Level, QuestionId};
use hamprep_core::{ExamConfig, ExamSubmission};

use super::stats::format_duration;
use super::App;

/// A session file as filled in by the learner.
///
/// Answers map question ids to concatenated labels, e.g. `{"17": "AC"}`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionFile {
    /// Level the questions were drawn for.
    #[serde(default)]
    level: Option<Level>,
    start_time: DateTime<Utc>,
    /// Defaults to the submission time.
    #[serde(default)]
    end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pause_count: u32,
    question_ids: Vec<QuestionId>,
    #[serde(default)]
    answers: HashMap<QuestionId, String>,
}

pub async fn start(app: &App, level: Option<Level>, output: Option<PathBuf>) -> Result<()> {
    let level = app.level(level);
    let config = ExamConfig::for_level(level);
    let question_ids = app.exam.start_exam(level).await?;

    println!(
        "Level {level} exam: {} questions, pass with {} correct, {} minutes.",
        config.question_count, config.pass_count, config.time_limit_minutes
    );

    match output {
        Some(path) => {
            let session = SessionFile {
                level: Some(level),
                start_time: Utc::now(),
                end_time: None,
                pause_count: 0,
                question_ids,
                answers: HashMap::new(),
            };
            let json = serde_json::to_string_pretty(&session)?;
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write session: {}", path.display()))?;
            println!("Session written to {}", path.display());
        }
        None => {
            let ids: Vec<String> = question_ids.iter().map(|id| id.to_string()).collect();
            println!("{}", ids.join(","));
        }
    }
    Ok(())
}

pub async fn submit(app: &App, level: Option<Level>, answers: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&answers)
        .with_context(|| format!("failed to read session: {}", answers.display()))?;
    let session: SessionFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse session: {}", answers.display()))?;

    // The session's own level wins over the configured default.
    let level = match (session.level, level) {
        (Some(drawn), Some(given)) if drawn != given => {
            bail!("session {} was drawn for level {drawn}, not {given}", answers.display())
        }
        (Some(drawn), _) => drawn,
        (None, given) => app.level(given),
    };

    let submission = ExamSubmission {
        level,
        start_time: session.start_time,
        end_time: session.end_time.unwrap_or_else(Utc::now),
        question_ids: session.question_ids,
        answers: session
            .answers
            .into_iter()
            .map(|(id, labels)| (id, split_labels(&labels)))
            .collect(),
        pause_count: session.pause_count,
    };
    let record = app.exam.submit_exam(submission).await?;

    println!(
        "Score: {:.2} ({}/{}) {}",
        record.score,
        record.correct_count,
        record.total_questions,
        if record.is_passed { "PASSED" } else { "FAILED" }
    );
    println!("Time: {}", format_duration(record.duration()));
    Ok(())
}

pub async fn history(app: &App, level: Option<Level>, limit: Option<usize>) -> Result<()> {
    let level = app.level(level);
    let limit = limit.unwrap_or(app.config.history_limit);
    let records = app.exam.history(level, limit).await?;

    if records.is_empty() {
        println!("No level {level} exams yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Finished", "Score", "Correct", "Time", "Pauses", "Result"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(record.end_time.format("%Y-%m-%d %H:%M")),
            Cell::new(format!("{:.2}", record.score)),
            Cell::new(format!(
                "{}/{} ({:.0}%)",
                record.correct_count,
                record.total_questions,
                record.accuracy() * 100.0
            )),
            Cell::new(format_duration(record.duration())),
            Cell::new(record.pause_count),
            Cell::new(if record.is_passed { "pass" } else { "fail" }),
        ]);
    }
    println!("{table}");
    Ok(())
}
