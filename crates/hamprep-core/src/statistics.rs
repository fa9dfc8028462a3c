//! Study and exam aggregate statistics.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{ExamRecord, Level};
use crate::traits::{QuestionStore, RecordStore};

/// Study progress for one level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyStats {
    pub level: Option<Level>,
    /// Questions in the level.
    pub total: usize,
    pub learned: usize,
    pub mastered: usize,
    pub wrong: usize,
    pub favorite: usize,
}

impl StudyStats {
    pub fn unlearned(&self) -> usize {
        self.total.saturating_sub(self.learned)
    }

    /// Fraction of the level learned, 0 when the level is empty.
    pub fn learn_progress(&self) -> f64 {
        ratio(self.learned, self.total)
    }

    /// Fraction of the level mastered, 0 when the level is empty.
    pub fn mastery_progress(&self) -> f64 {
        ratio(self.mastered, self.total)
    }
}

fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Compute the study statistics of a level from the two stores.
pub async fn compute_study_stats(
    questions: &dyn QuestionStore,
    records: &dyn RecordStore,
    level: Level,
) -> Result<StudyStats, StoreError> {
    let (total, counts) = futures::try_join!(
        questions.count_by_level(level),
        records.study_counts(level)
    )?;

    Ok(StudyStats {
        level: Some(level),
        total,
        learned: counts.learned.min(total),
        mastered: counts.mastered.min(total),
        wrong: counts.wrong.min(total),
        favorite: counts.favorite.min(total),
    })
}

/// Exam outcomes for one level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExamStats {
    pub total_count: usize,
    pub passed_count: usize,
    pub highest_score: f64,
    pub average_score: f64,
    /// Shortest duration among passed attempts, in milliseconds.
    pub fastest_pass_ms: Option<i64>,
}

impl ExamStats {
    pub fn fastest_pass_time(&self) -> Option<Duration> {
        self.fastest_pass_ms.map(Duration::milliseconds)
    }

    pub fn pass_rate(&self) -> f64 {
        ratio(self.passed_count, self.total_count)
    }
}

/// Aggregate a set of exam records.
pub fn summarize_exams(records: &[ExamRecord]) -> ExamStats {
    if records.is_empty() {
        return ExamStats::default();
    }

    let passed: Vec<&ExamRecord> = records.iter().filter(|r| r.is_passed).collect();

    let highest_score = records
        .iter()
        .map(|r| r.score)
        .fold(f64::NEG_INFINITY, f64::max);

    let average_score = records.iter().map(|r| r.score).sum::<f64>() / records.len() as f64;

    let fastest_pass_ms = passed
        .iter()
        .map(|r| r.duration().num_milliseconds())
        .min();

    ExamStats {
        total_count: records.len(),
        passed_count: passed.len(),
        highest_score,
        average_score,
        fastest_pass_ms,
    }
}
