//! In-memory question store.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;

use hamprep_core::bank;
use hamprep_core::error::StoreError;
use hamprep_core::model::{Level, Question, QuestionId};
use hamprep_core::traits::QuestionStore;

/// An immutable, indexed question bank held in memory.
pub struct MemoryQuestionStore {
    questions: Vec<Question>,
    by_id: HashMap<QuestionId, usize>,
    by_level: HashMap<Level, Vec<usize>>,
}

impl MemoryQuestionStore {
    /// Index a list of questions. Later duplicates of an id are ignored.
    pub fn new(questions: Vec<Question>) -> Self {
        let mut by_id = HashMap::new();
        let mut by_level: HashMap<Level, Vec<usize>> = HashMap::new();
        let mut kept = Vec::with_capacity(questions.len());

        for question in questions {
            if by_id.contains_key(&question.id) {
                tracing::warn!(id = question.id, "ignoring duplicate question");
                continue;
            }
            let idx = kept.len();
            by_id.insert(question.id, idx);
            by_level.entry(question.level).or_default().push(idx);
            kept.push(question);
        }

        Self {
            questions: kept,
            by_id,
            by_level,
        }
    }

    /// Load a bank file or directory.
    pub fn load(path: &Path) -> Result<Self> {
        let questions = bank::load_bank(path)?;
        tracing::debug!(count = questions.len(), path = %path.display(), "loaded question bank");
        Ok(Self::new(questions))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn level_questions(&self, level: Level) -> impl Iterator<Item = &Question> {
        self.by_level
            .get(&level)
            .into_iter()
            .flatten()
            .map(|&idx| &self.questions[idx])
    }
}

#[async_trait]
impl QuestionStore for MemoryQuestionStore {
    async fn by_id(&self, id: QuestionId) -> Result<Option<Question>, StoreError> {
        Ok(self.by_id.get(&id).map(|&idx| self.questions[idx].clone()))
    }

    async fn by_level(&self, level: Level) -> Result<Vec<Question>, StoreError> {
        Ok(self.level_questions(level).cloned().collect())
    }

    async fn count_by_level(&self, level: Level) -> Result<usize, StoreError> {
        Ok(self.by_level.get(&level).map_or(0, Vec::len))
    }

    async fn random_sample(&self, level: Level, n: usize) -> Result<Vec<Question>, StoreError> {
        let pool = self.by_level.get(&level).map(Vec::as_slice).unwrap_or(&[]);
        if pool.len() < n {
            return Err(StoreError::InsufficientPool {
                level,
                requested: n,
                available: pool.len(),
            });
        }

        let mut rng = rand::thread_rng();
        Ok(pool
            .choose_multiple(&mut rng, n)
            .map(|&idx| self.questions[idx].clone())
            .collect())
    }

    async fn search(&self, level: Level, keyword: &str) -> Result<Vec<Question>, StoreError> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return self.by_level(level).await;
        }

        Ok(self
            .level_questions(level)
            .filter(|q| {
                q.text.to_lowercase().contains(&needle)
                    || q.question_code.to_lowercase().contains(&needle)
                    || q
                        .options
                        .iter()
                        .any(|o| o.text.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }
}
