pub mod exam;
pub mod init;
pub mod logbook;
pub mod stats;
pub mod study;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use hamprep_core::model::{Level, Question, QuestionId};
use hamprep_core::traits::QuestionStore;
use hamprep_core::{ExamEngine, StudyProgressEngine};
use hamprep_store::{HamprepConfig, Stores};

/// Configuration and engines shared by the study, stats, and exam commands.
pub struct App {
    pub config: HamprepConfig,
    pub stores: Stores,
    pub study: StudyProgressEngine,
    pub exam: ExamEngine,
}

impl App {
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let config = hamprep_store::load_config_from(config_path)?;
        let stores = Stores::open(&config)?;
        Ok(Self {
            study: stores.study_engine(),
            exam: stores.exam_engine(),
            config,
            stores,
        })
    }

    pub fn level(&self, level: Option<Level>) -> Level {
        level.unwrap_or(self.config.default_level)
    }

    pub async fn question(&self, id: QuestionId) -> Result<Question> {
        self.stores
            .questions
            .by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("question {id} not found in the bank"))
    }
}
