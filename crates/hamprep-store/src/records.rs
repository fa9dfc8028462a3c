//! In-memory record store with optional write-through snapshots.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use hamprep_core::error::StoreError;
use hamprep_core::model::{ExamRecord, Level, QuestionId, StudyRecord};
use hamprep_core::traits::{RecordChange, RecordStore, StudyCounts};

use crate::snapshot::{Snapshot, SNAPSHOT_VERSION};

const CHANGE_CAPACITY: usize = 256;

#[derive(Debug, Clone, Default)]
struct RecordState {
    study: HashMap<QuestionId, StudyRecord>,
    exams: Vec<ExamRecord>,
}

impl RecordState {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut study = HashMap::with_capacity(snapshot.study_records.len());
        for record in snapshot.study_records {
            if study.insert(record.question_id, record).is_some() {
                tracing::warn!("snapshot held duplicate study records; keeping the last");
            }
        }
        Self {
            study,
            exams: snapshot.exam_records,
        }
    }

    fn to_snapshot(&self) -> Snapshot {
        let mut study_records: Vec<StudyRecord> = self.study.values().cloned().collect();
        study_records.sort_by_key(|r| r.question_id);
        Snapshot {
            version: SNAPSHOT_VERSION,
            study_records,
            exam_records: self.exams.clone(),
        }
    }

    fn level_records_mut(&mut self, level: Level) -> impl Iterator<Item = &mut StudyRecord> {
        self.study.values_mut().filter(move |r| r.level == level)
    }
}

/// A record store held in memory.
///
/// When opened on a path, every committed write is flushed to a JSON
/// snapshot before it becomes visible. A failed flush rolls the write back.
pub struct MemoryRecordStore {
    state: Mutex<RecordState>,
    path: Option<PathBuf>,
    changes: broadcast::Sender<RecordChange>,
    write_count: AtomicU64,
}

impl MemoryRecordStore {
    /// An empty, purely in-memory store.
    pub fn new() -> Self {
        Self::with_state(RecordState::default(), None)
    }

    /// Open a store backed by a snapshot file, creating it on first write.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = Snapshot::load(&path)?;
        tracing::debug!(
            path = %path.display(),
            study_records = snapshot.study_records.len(),
            exam_records = snapshot.exam_records.len(),
            "opened record store"
        );
        Ok(Self::with_state(RecordState::from_snapshot(snapshot), Some(path)))
    }

    fn with_state(state: RecordState, path: Option<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            state: Mutex::new(state),
            path,
            changes,
            write_count: AtomicU64::new(0),
        }
    }

    /// Number of committed writes since the store was opened.
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    async fn read<T>(&self, f: impl FnOnce(&RecordState) -> T) -> T {
        let state = self.state.lock().await;
        f(&state)
    }

    /// Apply a write atomically: either the mutation and its snapshot both
    /// land, or the state is restored and the error returned.
    ///
    /// The snapshot is written on the blocking pool while the state lock is
    /// held, so flushes land in commit order.
    async fn commit<T>(
        &self,
        change: RecordChange,
        f: impl FnOnce(&mut RecordState) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state.lock().await;
        let backup = self.path.as_ref().map(|_| state.clone());

        let value = f(&mut state)?;

        if let (Some(path), Some(backup)) = (&self.path, backup) {
            let snapshot = state.to_snapshot();
            let target = path.clone();
            let saved = tokio::task::spawn_blocking(move || snapshot.save(&target))
                .await
                .unwrap_or_else(|e| {
                    Err(StoreError::Unavailable(format!("snapshot writer failed: {e}")))
                });
            if let Err(e) = saved {
                *state = backup;
                tracing::error!(path = %path.display(), "failed to persist records: {e}");
                return Err(e);
            }
        }
        drop(state);

        self.write_count.fetch_add(1, Ordering::Relaxed);
        // No receivers is not an error.
        let _ = self.changes.send(change);
        Ok(value)
    }
}

impl Default for MemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn study_record(
        &self,
        question_id: QuestionId,
    ) -> Result<Option<StudyRecord>, StoreError> {
        Ok(self.read(|s| s.study.get(&question_id).cloned()).await)
    }

    async fn insert_study_record(&self, record: &StudyRecord) -> Result<(), StoreError> {
        let change = RecordChange::StudyRecord {
            question_id: record.question_id,
            level: record.level,
        };
        self.commit(change, |s| {
            if s.study.contains_key(&record.question_id) {
                return Err(StoreError::DuplicateRecord(record.question_id));
            }
            s.study.insert(record.question_id, record.clone());
            Ok(())
        })
        .await
    }

    async fn update_study_record(&self, record: &StudyRecord) -> Result<(), StoreError> {
        let change = RecordChange::StudyRecord {
            question_id: record.question_id,
            level: record.level,
        };
        self.commit(change, |s| match s.study.get_mut(&record.question_id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(())
            }
            None => Err(StoreError::RecordNotFound(record.question_id)),
        })
        .await
    }

    async fn study_records(&self, level: Level) -> Result<Vec<StudyRecord>, StoreError> {
        let records = self.read(|s| {
            let mut records: Vec<StudyRecord> = s
                .study
                .values()
                .filter(|r| r.level == level)
                .cloned()
                .collect();
            records.sort_by_key(|r| r.question_id);
            records
        })
        .await;
        Ok(records)
    }

    async fn study_counts(&self, level: Level) -> Result<StudyCounts, StoreError> {
        let counts = self.read(|s| {
            s.study
                .values()
                .filter(|r| r.level == level)
                .fold(StudyCounts::default(), |mut counts, r| {
                    counts.learned += r.is_learned as usize;
                    counts.mastered += r.is_mastered as usize;
                    counts.wrong += r.is_wrong as usize;
                    counts.favorite += r.is_favorite as usize;
                    counts
                })
        })
        .await;
        Ok(counts)
    }

    async fn reset_random_practice_done(&self, level: Level) -> Result<usize, StoreError> {
        self.commit(RecordChange::StudyLevel { level }, |s| {
            let mut touched = 0;
            for record in s.level_records_mut(level) {
                record.random_practice_done = false;
                touched += 1;
            }
            Ok(touched)
        })
        .await
    }

    async fn clear_random_practice(&self, level: Level) -> Result<usize, StoreError> {
        self.commit(RecordChange::StudyLevel { level }, |s| {
            let mut touched = 0;
            for record in s.level_records_mut(level) {
                record.random_practice_order = None;
                record.random_practice_done = false;
                touched += 1;
            }
            Ok(touched)
        })
        .await
    }

    async fn assign_random_practice_orders(
        &self,
        level: Level,
        orders: &[(QuestionId, u32)],
    ) -> Result<(), StoreError> {
        self.commit(RecordChange::StudyLevel { level }, |s| {
            if let Some(&(question_id, _)) = orders
                .iter()
                .find(|(id, _)| s.study.get(id).is_some_and(|r| r.level != level))
            {
                return Err(StoreError::LevelConflict { question_id, level });
            }
            for &(id, order) in orders {
                let record = s
                    .study
                    .entry(id)
                    .or_insert_with(|| StudyRecord::new(id, level));
                record.random_practice_order = Some(order);
                record.random_practice_done = false;
            }
            Ok(())
        })
        .await
    }

    async fn clear_study_records(&self, level: Option<Level>) -> Result<usize, StoreError> {
        self.commit(RecordChange::StudyCleared { level }, |s| {
            let before = s.study.len();
            match level {
                Some(level) => s.study.retain(|_, r| r.level != level),
                None => s.study.clear(),
            }
            Ok(before - s.study.len())
        })
        .await
    }

    async fn insert_exam_record(&self, record: &ExamRecord) -> Result<(), StoreError> {
        self.commit(RecordChange::ExamRecord { level: record.level }, |s| {
            s.exams.push(record.clone());
            Ok(())
        })
        .await
    }

    async fn exam_records(&self, level: Level) -> Result<Vec<ExamRecord>, StoreError> {
        let exams: Vec<ExamRecord> = self.read(|s| {
            s.exams
                .iter()
                .filter(|r| r.level == level)
                .cloned()
                .collect()
        })
        .await;
        Ok(exams)
    }

    fn subscribe(&self) -> broadcast::Receiver<RecordChange> {
        self.changes.subscribe()
    }
}
