//! hamprep-store: storage backends for the hamprep engines.
//!
//! Implements the `QuestionStore` and `RecordStore` traits in memory, with
//! JSON snapshot persistence for study and exam records.

pub mod config;
pub mod questions;
pub mod records;
pub mod snapshot;

use std::sync::Arc;

use anyhow::{Context, Result};

use hamprep_core::{ExamEngine, StudyProgressEngine};

pub use config::{load_config, load_config_from, HamprepConfig};
pub use questions::MemoryQuestionStore;
pub use records::MemoryRecordStore;

/// Store handles opened once at startup and shared by both engines.
#[derive(Clone)]
pub struct Stores {
    pub questions: Arc<MemoryQuestionStore>,
    pub records: Arc<MemoryRecordStore>,
}

impl Stores {
    /// Open the question bank and record snapshot named by a configuration.
    pub fn open(config: &HamprepConfig) -> Result<Self> {
        let bank_path = config.question_bank_path();
        if !bank_path.exists() {
            anyhow::bail!(
                "question bank not found: {} (run `hamprep init` to create a sample)",
                bank_path.display()
            );
        }
        let questions = MemoryQuestionStore::load(&bank_path)?;

        let records_path = config.records_path();
        let records = MemoryRecordStore::open(&records_path)
            .with_context(|| format!("failed to open records: {}", records_path.display()))?;

        Ok(Self {
            questions: Arc::new(questions),
            records: Arc::new(records),
        })
    }

    /// Wrap already-built stores.
    pub fn new(questions: MemoryQuestionStore, records: MemoryRecordStore) -> Self {
        Self {
            questions: Arc::new(questions),
            records: Arc::new(records),
        }
    }

    pub fn study_engine(&self) -> StudyProgressEngine {
        StudyProgressEngine::new(self.questions.clone(), self.records.clone())
    }

    pub fn exam_engine(&self) -> ExamEngine {
        ExamEngine::new(self.questions.clone(), self.records.clone())
    }
}
