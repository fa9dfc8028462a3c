//! Exam session lifecycle.
//!
//! `NotStarted -> InProgress <-> Paused -> Completed | Abandoned`. Only
//! completion writes an exam record; abandoning discards the session.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::exam::{ExamConfig, ExamEngine, ExamSubmission};
use crate::model::{ExamRecord, Level, QuestionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Paused,
    Completed,
    Abandoned,
}

impl SessionState {
    pub fn is_finished(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Abandoned)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::NotStarted => write!(f, "not started"),
            SessionState::InProgress => write!(f, "in progress"),
            SessionState::Paused => write!(f, "paused"),
            SessionState::Completed => write!(f, "completed"),
            SessionState::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// A timed exam attempt driven by the caller.
#[derive(Debug, Clone)]
pub struct ExamSession {
    level: Level,
    config: ExamConfig,
    question_ids: Vec<QuestionId>,
    answers: HashMap<QuestionId, Vec<String>>,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    /// Start of the current running stretch; `None` while paused.
    resumed_at: Option<DateTime<Utc>>,
    /// Active time accumulated before the current stretch.
    active: Duration,
    pause_count: u32,
}

impl ExamSession {
    pub fn new(level: Level, question_ids: Vec<QuestionId>) -> Self {
        Self {
            level,
            config: ExamConfig::for_level(level),
            question_ids,
            answers: HashMap::new(),
            state: SessionState::NotStarted,
            started_at: None,
            resumed_at: None,
            active: Duration::zero(),
            pause_count: 0,
        }
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn question_ids(&self) -> &[QuestionId] {
        &self.question_ids
    }

    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    pub fn answer_for(&self, question_id: QuestionId) -> Option<&[String]> {
        self.answers.get(&question_id).map(Vec::as_slice)
    }

    fn transition(
        &mut self,
        action: &'static str,
        allowed: &[SessionState],
        to: SessionState,
    ) -> Result<()> {
        if !allowed.contains(&self.state) {
            return Err(EngineError::InvalidTransition {
                action,
                state: self.state,
            });
        }
        tracing::debug!(from = %self.state, to = %to, "exam session transition");
        self.state = to;
        Ok(())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition("start", &[SessionState::NotStarted], SessionState::InProgress)?;
        self.started_at = Some(now);
        self.resumed_at = Some(now);
        Ok(())
    }

    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition("pause", &[SessionState::InProgress], SessionState::Paused)?;
        if let Some(resumed) = self.resumed_at.take() {
            self.active = self.active + (now - resumed);
        }
        self.pause_count += 1;
        Ok(())
    }

    pub fn resume(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition("resume", &[SessionState::Paused], SessionState::InProgress)?;
        self.resumed_at = Some(now);
        Ok(())
    }

    /// Record (or replace) the selection for one question.
    pub fn answer(&mut self, question_id: QuestionId, selected: Vec<String>) -> Result<()> {
        if self.state != SessionState::InProgress {
            return Err(EngineError::InvalidTransition {
                action: "answer in",
                state: self.state,
            });
        }
        if !self.question_ids.contains(&question_id) {
            return Err(EngineError::QuestionNotFound(question_id));
        }
        self.answers.insert(question_id, selected);
        Ok(())
    }

    /// Active (unpaused) time spent so far.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.resumed_at {
            Some(resumed) => self.active + (now - resumed),
            None => self.active,
        }
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.config.time_limit() - self.elapsed(now)).max(Duration::zero())
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.elapsed(now) >= self.config.time_limit()
    }

    /// Finish the session and score it. The record is written exactly once.
    pub async fn complete(&mut self, engine: &ExamEngine, now: DateTime<Utc>) -> Result<ExamRecord> {
        if !matches!(self.state, SessionState::InProgress | SessionState::Paused) {
            return Err(EngineError::InvalidTransition {
                action: "complete",
                state: self.state,
            });
        }

        let submission = ExamSubmission {
            level: self.level,
            start_time: self.started_at.unwrap_or(now),
            end_time: now,
            question_ids: self.question_ids.clone(),
            answers: self.answers.clone(),
            pause_count: self.pause_count,
        };
        let record = engine.submit_exam(submission).await?;

        if let Some(resumed) = self.resumed_at.take() {
            self.active = self.active + (now - resumed);
        }
        self.state = SessionState::Completed;
        Ok(record)
    }

    /// Give up on the session. Nothing is persisted.
    pub fn abandon(&mut self) -> Result<()> {
        self.transition(
            "abandon",
            &[
                SessionState::NotStarted,
                SessionState::InProgress,
                SessionState::Paused,
            ],
            SessionState::Abandoned,
        )?;
        self.resumed_at = None;
        Ok(())
    }
}
