//! JSON snapshot persistence for the record store.

use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use hamprep_core::error::StoreError;
use hamprep_core::model::{ExamRecord, StudyRecord};

pub const SNAPSHOT_VERSION: u32 = 1;

/// On-disk form of the record store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    #[serde(default)]
    pub study_records: Vec<StudyRecord>,
    #[serde(default)]
    pub exam_records: Vec<ExamRecord>,
}

impl Snapshot {
    /// Read a snapshot; a missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Snapshot {
                    version: SNAPSHOT_VERSION,
                    ..Default::default()
                });
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| {
            StoreError::Unavailable(format!("corrupt snapshot {}: {e}", path.display()))
        })
    }

    /// Write the snapshot. The previous file stays intact if this fails.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| StoreError::Unavailable(format!("failed to encode snapshot: {e}")))?;
        write_atomic(path, &json)
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hamprep_core::model::Level;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = Snapshot::load(&dir.path().join("none.json")).unwrap();
        assert!(snapshot.study_records.is_empty());
        assert_eq!(snapshot.version, SNAPSHOT_VERSION);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("records.json");
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            study_records: vec![StudyRecord::new(3, Level::B)],
            exam_records: vec![],
        };
        snapshot.save(&path).unwrap();

        let loaded = Snapshot::load(&path).unwrap();
        assert_eq!(loaded.study_records, snapshot.study_records);
    }

    #[test]
    fn corrupt_snapshot_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = Snapshot::load(&path).unwrap_err();
        assert!(err.to_string().contains("corrupt snapshot"));
    }
}
