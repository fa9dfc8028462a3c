//! Study progress engine.
//!
//! Owns the study-record lifecycle. Every mutation is a read-modify-write
//! of one record, serialized per question. Level-wide batches (practice
//! resets, clearing) take the level's write lock, so no per-question update
//! can interleave with them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rand::seq::SliceRandom;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, OwnedMutexGuard, RwLock};

use crate::error::{EngineError, Result, StoreError};
use crate::model::{FilterKind, Level, Question, QuestionId, StudyRecord};
use crate::statistics::{compute_study_stats, StudyStats};
use crate::traits::{QuestionStore, RecordStore};

/// Per-question async locks.
///
/// Entries are never evicted; the map is bounded by the size of the bank.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<QuestionId, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, id: QuestionId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(id).or_default())
        };
        lock.lock_owned().await
    }
}

/// A question joined with its study record, if any.
#[derive(Debug, Clone)]
pub struct StudyItem {
    pub question: Question,
    pub record: Option<StudyRecord>,
}

/// The study progress engine.
pub struct StudyProgressEngine {
    questions: Arc<dyn QuestionStore>,
    records: Arc<dyn RecordStore>,
    keys: KeyedLocks,
    levels: [RwLock<()>; 3],
}

impl StudyProgressEngine {
    pub fn new(questions: Arc<dyn QuestionStore>, records: Arc<dyn RecordStore>) -> Self {
        Self {
            questions,
            records,
            keys: KeyedLocks::default(),
            levels: [RwLock::new(()), RwLock::new(()), RwLock::new(())],
        }
    }

    fn level_lock(&self, level: Level) -> &RwLock<()> {
        &self.levels[level.index()]
    }

    /// Check that a question is in the bank and filed under `level`.
    ///
    /// Records copy the level of their question, so a mismatch here would
    /// count the record toward the wrong level.
    async fn resolve(&self, question_id: QuestionId, level: Level) -> Result<Question> {
        let question = self
            .questions
            .by_id(question_id)
            .await?
            .ok_or(EngineError::QuestionNotFound(question_id))?;
        if question.level != level {
            return Err(EngineError::LevelMismatch {
                question_id,
                expected: level,
                actual: question.level,
            });
        }
        Ok(question)
    }

    /// Fetch the record of a question, creating a blank one on first use.
    pub async fn get_or_create(&self, question_id: QuestionId, level: Level) -> Result<StudyRecord> {
        self.resolve(question_id, level).await?;
        let _level = self.level_lock(level).read().await;
        let _key = self.keys.lock(question_id).await;

        if let Some(record) = self.records.study_record(question_id).await? {
            return Ok(record);
        }

        let record = StudyRecord::new(question_id, level);
        match self.records.insert_study_record(&record).await {
            Ok(()) => {
                tracing::debug!(question_id, %level, "created study record");
                Ok(record)
            }
            // Another process won the insert; use its record.
            Err(e) if e.is_duplicate() => self.existing(question_id).await,
            Err(e) => Err(e.into()),
        }
    }

    async fn existing(&self, question_id: QuestionId) -> Result<StudyRecord> {
        self.records
            .study_record(question_id)
            .await?
            .ok_or(EngineError::Store(StoreError::RecordNotFound(question_id)))
    }

    /// Run a read-modify-write on one record under its locks.
    ///
    /// A first touch builds the record and inserts it already modified, so it
    /// costs one store write.
    async fn mutate<F>(&self, question_id: QuestionId, level: Level, f: F) -> Result<StudyRecord>
    where
        F: Fn(&mut StudyRecord) + Send + Sync,
    {
        self.resolve(question_id, level).await?;
        let _level = self.level_lock(level).read().await;
        let _key = self.keys.lock(question_id).await;

        if let Some(mut record) = self.records.study_record(question_id).await? {
            f(&mut record);
            self.records.update_study_record(&record).await?;
            return Ok(record);
        }

        let mut record = StudyRecord::new(question_id, level);
        f(&mut record);
        match self.records.insert_study_record(&record).await {
            Ok(()) => {
                tracing::debug!(question_id, %level, "created study record");
                Ok(record)
            }
            // Another process won the insert; apply the change to its record.
            Err(e) if e.is_duplicate() => {
                let mut record = self.existing(question_id).await?;
                f(&mut record);
                self.records.update_study_record(&record).await?;
                Ok(record)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The record of a question, without creating one.
    pub async fn record(&self, question_id: QuestionId) -> Result<Option<StudyRecord>> {
        Ok(self.records.study_record(question_id).await?)
    }

    pub async fn mark_learned(&self, question_id: QuestionId, level: Level) -> Result<StudyRecord> {
        self.mutate(question_id, level, |r| {
            r.is_learned = true;
            r.touch();
        })
        .await
    }

    /// Flip the mastered flag. Mastering implies having learned.
    pub async fn toggle_mastered(
        &self,
        question_id: QuestionId,
        level: Level,
    ) -> Result<StudyRecord> {
        self.mutate(question_id, level, |r| {
            r.is_mastered = !r.is_mastered;
            r.is_learned = true;
            r.touch();
        })
        .await
    }

    /// Record an answer attempt.
    ///
    /// A wrong answer sets the wrong flag and bumps the counter. A correct
    /// answer never clears either.
    pub async fn record_answer(
        &self,
        question_id: QuestionId,
        level: Level,
        is_correct: bool,
    ) -> Result<StudyRecord> {
        let record = self
            .mutate(question_id, level, |r| {
                r.is_learned = true;
                if !is_correct {
                    r.is_wrong = true;
                    r.wrong_count = r.wrong_count.saturating_add(1);
                }
                r.touch();
            })
            .await?;
        tracing::debug!(
            question_id,
            is_correct,
            wrong_count = record.wrong_count,
            "recorded answer"
        );
        Ok(record)
    }

    pub async fn toggle_favorite(
        &self,
        question_id: QuestionId,
        level: Level,
    ) -> Result<StudyRecord> {
        self.mutate(question_id, level, |r| r.is_favorite = !r.is_favorite)
            .await
    }

    /// Questions of a level joined with their records, filtered.
    pub async fn filter(&self, level: Level, kind: FilterKind) -> Result<Vec<StudyItem>> {
        let questions = self.questions.by_level(level).await?;
        let mut records: HashMap<QuestionId, StudyRecord> = self
            .records
            .study_records(level)
            .await?
            .into_iter()
            .map(|r| (r.question_id, r))
            .collect();

        Ok(questions
            .into_iter()
            .filter_map(|question| {
                let record = records.remove(&question.id);
                kind.matches(record.as_ref())
                    .then_some(StudyItem { question, record })
            })
            .collect())
    }

    /// Questions of a level matching a keyword, joined with their records.
    pub async fn search(&self, level: Level, keyword: &str) -> Result<Vec<StudyItem>> {
        let questions = self.questions.search(level, keyword).await?;
        let mut items = Vec::with_capacity(questions.len());
        for question in questions {
            let record = self.records.study_record(question.id).await?;
            items.push(StudyItem { question, record });
        }
        Ok(items)
    }

    /// Set the practice order of an existing record.
    pub async fn update_random_practice_order(
        &self,
        question_id: QuestionId,
        order: u32,
    ) -> Result<StudyRecord> {
        let level = self
            .records
            .study_record(question_id)
            .await?
            .ok_or(StoreError::RecordNotFound(question_id))?
            .level;

        let _level = self.level_lock(level).read().await;
        let _key = self.keys.lock(question_id).await;

        // Re-read under the lock; a clear may have removed it meanwhile.
        let mut record = self.existing(question_id).await?;
        record.random_practice_order = Some(order);
        self.records.update_study_record(&record).await?;
        Ok(record)
    }

    pub async fn mark_random_practice_done(
        &self,
        question_id: QuestionId,
        level: Level,
    ) -> Result<StudyRecord> {
        self.mutate(question_id, level, |r| r.random_practice_done = true)
            .await
    }

    /// Start the practice cycle over, keeping the shuffle order.
    pub async fn reset_random_practice_done(&self, level: Level) -> Result<usize> {
        let _level = self.level_lock(level).write().await;
        let touched = self.records.reset_random_practice_done(level).await?;
        tracing::info!(%level, touched, "reset random practice progress");
        Ok(touched)
    }

    /// Drop the shuffle order and progress, forcing a fresh shuffle.
    pub async fn full_reset_random_practice(&self, level: Level) -> Result<usize> {
        let _level = self.level_lock(level).write().await;
        let touched = self.records.clear_random_practice(level).await?;
        tracing::info!(%level, touched, "cleared random practice order");
        Ok(touched)
    }

    /// The pending random-practice queue of a level.
    ///
    /// If any question of the level has no practice order yet, the whole
    /// level is reshuffled first. Returns ids not yet done, in order.
    pub async fn random_practice_queue(&self, level: Level) -> Result<Vec<QuestionId>> {
        let _level = self.level_lock(level).write().await;

        let questions = self.questions.by_level(level).await?;
        let mut records: HashMap<QuestionId, StudyRecord> = self
            .records
            .study_records(level)
            .await?
            .into_iter()
            .map(|r| (r.question_id, r))
            .collect();

        let needs_shuffle = questions.iter().any(|q| {
            records
                .get(&q.id)
                .map_or(true, |r| r.random_practice_order.is_none())
        });

        if needs_shuffle {
            let mut ids: Vec<QuestionId> = questions.iter().map(|q| q.id).collect();
            ids.shuffle(&mut rand::thread_rng());
            let orders: Vec<(QuestionId, u32)> = ids
                .iter()
                .enumerate()
                .map(|(order, id)| (*id, order as u32))
                .collect();

            // Creates the missing records in the same commit.
            self.records
                .assign_random_practice_orders(level, &orders)
                .await?;
            records = self
                .records
                .study_records(level)
                .await?
                .into_iter()
                .map(|r| (r.question_id, r))
                .collect();
            tracing::info!(%level, questions = orders.len(), "shuffled random practice order");
        }

        let mut pending: Vec<(u32, QuestionId)> = questions
            .iter()
            .filter_map(|q| records.get(&q.id))
            .filter(|r| !r.random_practice_done)
            .filter_map(|r| r.random_practice_order.map(|o| (o, r.question_id)))
            .collect();
        pending.sort_unstable();

        Ok(pending.into_iter().map(|(_, id)| id).collect())
    }

    /// Delete the study records of one level, or of every level.
    pub async fn clear_records(&self, level: Option<Level>) -> Result<usize> {
        let guards = match level {
            Some(level) => vec![self.level_lock(level).write().await],
            None => {
                let mut guards = Vec::with_capacity(Level::ALL.len());
                for level in Level::ALL {
                    guards.push(self.level_lock(level).write().await);
                }
                guards
            }
        };

        let removed = self.records.clear_study_records(level).await?;
        drop(guards);

        match level {
            Some(level) => tracing::info!(%level, removed, "cleared study records"),
            None => tracing::info!(removed, "cleared all study records"),
        }
        Ok(removed)
    }

    pub async fn clear_all_records(&self) -> Result<usize> {
        self.clear_records(None).await
    }

    /// Current study statistics of a level.
    pub async fn stats(&self, level: Level) -> Result<StudyStats> {
        Ok(compute_study_stats(self.questions.as_ref(), self.records.as_ref(), level).await?)
    }

    /// A live view of a level's statistics.
    ///
    /// The receiver is refreshed whenever a write that touches the level
    /// commits. The background task stops once every receiver is dropped.
    pub async fn watch_stats(&self, level: Level) -> Result<watch::Receiver<StudyStats>> {
        // Subscribe before the first read so no commit slips between them.
        let mut changes = self.records.subscribe();
        let initial = self.stats(level).await?;
        let (tx, rx) = watch::channel(initial);

        let questions = Arc::clone(&self.questions);
        let records = Arc::clone(&self.records);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    change = changes.recv() => match change {
                        Ok(change) if !change.affects_study(level) => continue,
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::debug!(skipped, "stats watcher lagged, recomputing");
                        }
                        Err(RecvError::Closed) => break,
                    },
                }

                match compute_study_stats(questions.as_ref(), records.as_ref(), level).await {
                    Ok(stats) => {
                        tx.send_if_modified(|current| {
                            if *current == stats {
                                false
                            } else {
                                *current = stats;
                                true
                            }
                        });
                    }
                    Err(e) => tracing::warn!(%level, "failed to refresh study stats: {e}"),
                }
            }
        });

        Ok(rx)
    }
}
