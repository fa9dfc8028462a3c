//! Storage traits consumed by the engines.
//!
//! These async traits are implemented by the `hamprep-store` crate. The
//! engines receive them as explicitly constructed handles.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::model::{ExamRecord, Level, Question, QuestionId, StudyRecord};

// ---------------------------------------------------------------------------
// Question store
// ---------------------------------------------------------------------------

/// Read-only provider of immutable questions.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Look up a single question.
    async fn by_id(&self, id: QuestionId) -> Result<Option<Question>, StoreError>;

    /// All questions of a level, in bank order.
    async fn by_level(&self, level: Level) -> Result<Vec<Question>, StoreError>;

    /// Number of questions in a level.
    async fn count_by_level(&self, level: Level) -> Result<usize, StoreError>;

    /// Draw `n` distinct questions at random.
    ///
    /// Fails with [`StoreError::InsufficientPool`] if the level holds fewer
    /// than `n` questions.
    async fn random_sample(&self, level: Level, n: usize) -> Result<Vec<Question>, StoreError>;

    /// Case-insensitive keyword search within a level.
    async fn search(&self, level: Level, keyword: &str) -> Result<Vec<Question>, StoreError>;
}

// ---------------------------------------------------------------------------
// Record store
// ---------------------------------------------------------------------------

/// Per-level flag counts over stored study records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudyCounts {
    pub learned: usize,
    pub mastered: usize,
    pub wrong: usize,
    pub favorite: usize,
}

/// A committed write, pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    /// One study record was inserted or updated.
    StudyRecord {
        question_id: QuestionId,
        level: Level,
    },
    /// A batch update touched many records of a level.
    StudyLevel { level: Level },
    /// Study records were deleted, for one level or all of them.
    StudyCleared { level: Option<Level> },
    /// An exam record was appended.
    ExamRecord { level: Level },
}

impl RecordChange {
    /// Whether this change can alter the study statistics of `level`.
    pub fn affects_study(&self, level: Level) -> bool {
        match self {
            RecordChange::StudyRecord { level: l, .. } | RecordChange::StudyLevel { level: l } => {
                *l == level
            }
            RecordChange::StudyCleared { level: l } => l.is_none() || *l == Some(level),
            RecordChange::ExamRecord { .. } => false,
        }
    }
}

/// Durable storage for study and exam records.
///
/// Every method is atomic with respect to the others: a batch operation is
/// applied entirely or not at all, and subscribers only observe committed
/// writes.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The study record of a question, if one exists.
    async fn study_record(&self, question_id: QuestionId)
        -> Result<Option<StudyRecord>, StoreError>;

    /// Insert a new study record.
    ///
    /// Fails with [`StoreError::DuplicateRecord`] if the question already has one.
    async fn insert_study_record(&self, record: &StudyRecord) -> Result<(), StoreError>;

    /// Replace an existing study record.
    ///
    /// Fails with [`StoreError::RecordNotFound`] if the question has none.
    async fn update_study_record(&self, record: &StudyRecord) -> Result<(), StoreError>;

    /// All study records of a level.
    async fn study_records(&self, level: Level) -> Result<Vec<StudyRecord>, StoreError>;

    /// Flag counts for a level, computed from one consistent view.
    async fn study_counts(&self, level: Level) -> Result<StudyCounts, StoreError>;

    /// Clear `randomPracticeDone` for every record of a level, keeping orders.
    /// Returns the number of records touched.
    async fn reset_random_practice_done(&self, level: Level) -> Result<usize, StoreError>;

    /// Clear both the practice order and the done flag for every record of a level.
    async fn clear_random_practice(&self, level: Level) -> Result<usize, StoreError>;

    /// Assign practice orders to questions of a level in one batch, clearing
    /// their done flags. Questions without a record get a blank one of
    /// `level` in the same commit. Fails without writing anything if a
    /// listed record belongs to another level.
    async fn assign_random_practice_orders(
        &self,
        level: Level,
        orders: &[(QuestionId, u32)],
    ) -> Result<(), StoreError>;

    /// Delete study records of one level, or of every level when `None`.
    async fn clear_study_records(&self, level: Option<Level>) -> Result<usize, StoreError>;

    /// Append a completed exam.
    async fn insert_exam_record(&self, record: &ExamRecord) -> Result<(), StoreError>;

    /// Stored exams of a level, oldest first.
    async fn exam_records(&self, level: Level) -> Result<Vec<ExamRecord>, StoreError>;

    /// Subscribe to committed writes.
    fn subscribe(&self) -> broadcast::Receiver<RecordChange>;
}
