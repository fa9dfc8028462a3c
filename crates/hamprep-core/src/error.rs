//! Engine and store error types.
//!
//! Store errors are typed so the engines can recover from conflicts (a
//! concurrent insert of the same study record) without string matching.

use thiserror::Error;

use crate::model::{Level, QuestionId};
use crate::session::SessionState;

/// Errors raised by a question or record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A study record for this question already exists.
    #[error("study record for question {0} already exists")]
    DuplicateRecord(QuestionId),

    /// No study record exists for this question.
    #[error("no study record for question {0}")]
    RecordNotFound(QuestionId),

    /// A batch named a record filed under another level.
    #[error("study record {question_id} is not filed under level {level}")]
    LevelConflict { question_id: QuestionId, level: Level },

    /// The level's question pool is smaller than the requested sample.
    #[error("question pool for level {level} holds {available} questions, {requested} requested")]
    InsufficientPool {
        level: Level,
        requested: usize,
        available: usize,
    },

    /// The backing storage could not be reached or written.
    #[error("record store unavailable: {0}")]
    Unavailable(String),

    /// An I/O error from the backing storage.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if a concurrent writer already created the record.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::DuplicateRecord(_))
    }

    /// Returns `true` if the failure is a pool shortfall rather than an outage.
    pub fn is_insufficient_pool(&self) -> bool {
        matches!(self, StoreError::InsufficientPool { .. })
    }
}

/// Errors raised by the study and exam engines.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The question is not in the bank.
    #[error("question {0} not found")]
    QuestionNotFound(QuestionId),

    /// The question exists but belongs to another level.
    #[error("question {question_id} belongs to level {actual}, not {expected}")]
    LevelMismatch {
        question_id: QuestionId,
        expected: Level,
        actual: Level,
    },

    /// An exam must cover exactly the level's question count, each once.
    #[error("a level {level} exam needs {expected} distinct questions, got {actual}")]
    QuestionCount {
        level: Level,
        expected: usize,
        actual: usize,
    },

    /// The exam session cannot perform this transition from its current state.
    #[error("cannot {action} an exam session that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    /// An exam was submitted without any questions.
    #[error("exam has no questions")]
    EmptyExam,
}

impl EngineError {
    /// Returns `true` if the error came from an undersized question pool.
    pub fn is_insufficient_pool(&self) -> bool {
        matches!(self, EngineError::Store(e) if e.is_insufficient_pool())
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
