//! Mock exam configuration, question drawing, and scoring.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::answer::check_answer;
use crate::error::{EngineError, Result};
use crate::model::{ExamAnswer, ExamRecord, Level, QuestionId};
use crate::session::ExamSession;
use crate::statistics::{summarize_exams, ExamStats};
use crate::traits::{QuestionStore, RecordStore};

/// Exam parameters for one level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamConfig {
    pub question_count: u32,
    pub pass_count: u32,
    pub time_limit_minutes: u32,
}

impl ExamConfig {
    pub const LEVEL_A: ExamConfig = ExamConfig {
        question_count: 40,
        pass_count: 30,
        time_limit_minutes: 40,
    };
    pub const LEVEL_B: ExamConfig = ExamConfig {
        question_count: 60,
        pass_count: 45,
        time_limit_minutes: 60,
    };
    pub const LEVEL_C: ExamConfig = ExamConfig {
        question_count: 90,
        pass_count: 70,
        time_limit_minutes: 90,
    };

    pub const fn for_level(level: Level) -> ExamConfig {
        match level {
            Level::A => Self::LEVEL_A,
            Level::B => Self::LEVEL_B,
            Level::C => Self::LEVEL_C,
        }
    }

    /// Look up a configuration by level name.
    ///
    /// Unrecognized names fall back to level A.
    pub fn lookup(level: &str) -> ExamConfig {
        match level.parse::<Level>() {
            Ok(level) => Self::for_level(level),
            Err(_) => {
                tracing::warn!(level, "unknown exam level, using level A configuration");
                Self::LEVEL_A
            }
        }
    }

    /// Minimum score (percent) needed to pass.
    pub fn pass_score(&self) -> f64 {
        percentage(self.pass_count, self.question_count)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::minutes(self.time_limit_minutes as i64)
    }
}

/// Uniform-weight percentage. Scores and pass marks both go through here so
/// that equal ratios compare equal.
fn percentage(part: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Everything needed to score a finished exam.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubmission {
    pub level: Level,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub question_ids: Vec<QuestionId>,
    /// Selected labels per question; unanswered questions are omitted.
    #[serde(default)]
    pub answers: HashMap<QuestionId, Vec<String>>,
    #[serde(default)]
    pub pause_count: u32,
}

/// The exam engine.
pub struct ExamEngine {
    questions: Arc<dyn QuestionStore>,
    records: Arc<dyn RecordStore>,
}

impl ExamEngine {
    pub fn new(questions: Arc<dyn QuestionStore>, records: Arc<dyn RecordStore>) -> Self {
        Self { questions, records }
    }

    /// Draw the question set for a new exam.
    pub async fn start_exam(&self, level: Level) -> Result<Vec<QuestionId>> {
        let config = ExamConfig::for_level(level);
        let drawn = self
            .questions
            .random_sample(level, config.question_count as usize)
            .await?;
        tracing::debug!(%level, count = drawn.len(), "drew exam questions");
        Ok(drawn.into_iter().map(|q| q.id).collect())
    }

    /// Draw a question set and wrap it in a fresh session.
    pub async fn new_session(&self, level: Level) -> Result<ExamSession> {
        let question_ids = self.start_exam(level).await?;
        Ok(ExamSession::new(level, question_ids))
    }

    /// Score an exam and append its record.
    ///
    /// The question set must match the level's exam: exactly
    /// `question_count` distinct questions, all of that level. Unanswered
    /// questions count as wrong.
    pub async fn submit_exam(&self, submission: ExamSubmission) -> Result<ExamRecord> {
        if submission.question_ids.is_empty() {
            return Err(EngineError::EmptyExam);
        }

        let config = ExamConfig::for_level(submission.level);
        let distinct: HashSet<QuestionId> = submission.question_ids.iter().copied().collect();
        let expected = config.question_count as usize;
        if distinct.len() != submission.question_ids.len() || distinct.len() != expected {
            return Err(EngineError::QuestionCount {
                level: submission.level,
                expected,
                actual: distinct.len(),
            });
        }

        let mut correct_count = 0u32;
        let mut answers = Vec::with_capacity(submission.question_ids.len());

        for &question_id in &submission.question_ids {
            let question = self
                .questions
                .by_id(question_id)
                .await?
                .ok_or(EngineError::QuestionNotFound(question_id))?;
            if question.level != submission.level {
                return Err(EngineError::LevelMismatch {
                    question_id,
                    expected: submission.level,
                    actual: question.level,
                });
            }

            let selected = submission
                .answers
                .get(&question_id)
                .cloned()
                .unwrap_or_default();
            if check_answer(&question.answer, selected.as_slice()) {
                correct_count += 1;
            }
            answers.push(ExamAnswer {
                question_id,
                selected,
            });
        }

        let total = submission.question_ids.len() as u32;
        let score = percentage(correct_count, total);
        let record = ExamRecord {
            id: Uuid::new_v4(),
            level: submission.level,
            start_time: submission.start_time,
            end_time: submission.end_time,
            total_questions: total,
            correct_count,
            wrong_count: total - correct_count,
            score,
            is_passed: score >= config.pass_score(),
            pause_count: submission.pause_count,
            question_ids: submission.question_ids,
            answers,
        };

        self.records.insert_exam_record(&record).await?;
        tracing::info!(
            level = %record.level,
            score = record.score,
            passed = record.is_passed,
            "exam submitted"
        );
        Ok(record)
    }

    /// Aggregate outcomes of stored exams.
    pub async fn stats(&self, level: Level) -> Result<ExamStats> {
        let records = self.records.exam_records(level).await?;
        Ok(summarize_exams(&records))
    }

    /// Stored exams, newest first.
    pub async fn history(&self, level: Level, limit: usize) -> Result<Vec<ExamRecord>> {
        let mut records = self.records.exam_records(level).await?;
        records.sort_by(|a, b| b.end_time.cmp(&a.end_time));
        records.truncate(limit);
        Ok(records)
    }
}
