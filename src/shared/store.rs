use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::warn;

use crate::domain::PlantRecord;
use crate::error::{ConfigurationError, PersistenceError, StoreError};
use crate::validators::validate_subject_id;

const RECORD_PREFIX: &str = "plant_data_";
const RECORD_SUFFIX: &str = ".json";

/// Filesystem-backed store of plant records, one JSON file per subject
///
/// Writers must hold the subject's lock across the whole load/update/save
/// cycle so concurrent updates never interleave.
pub struct PlantStore {
    data_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PlantStore {
    /// Open a store rooted at the given directory, creating it if absent
    pub async fn new(data_dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let data_dir = data_dir.into();
        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|source| PersistenceError::CreateDir {
                path: data_dir.clone(),
                source,
            })?;

        Ok(Self {
            data_dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    /// Path of a subject's record file
    pub fn record_path(&self, subject_id: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}{}{}", RECORD_PREFIX, subject_id, RECORD_SUFFIX))
    }

    /// Acquire the subject's read-modify-write lock
    pub async fn lock_subject(&self, subject_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks.entry(subject_id.to_string()).or_default().clone()
        };
        lock.lock_owned().await
    }

    /// Load a subject's record
    /// Returns Ok(None) when the subject has no record file
    pub async fn load(&self, subject_id: &str) -> Result<Option<PlantRecord>, StoreError> {
        validate_subject_id(subject_id).map_err(|source| ConfigurationError::Invalid {
            subject_id: subject_id.to_string(),
            source,
        })?;

        let path = self.record_path(subject_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistenceError::Read {
                    subject_id: subject_id.to_string(),
                    source,
                }
                .into())
            }
        };

        let record: PlantRecord =
            serde_json::from_slice(&bytes).map_err(|source| ConfigurationError::Malformed {
                subject_id: subject_id.to_string(),
                source,
            })?;

        Ok(Some(record))
    }

    /// Save a subject's record atomically
    /// Writes a temp sibling first, then renames over the record file, so a
    /// crash mid-write never leaves a truncated record
    pub async fn save(&self, subject_id: &str, record: &PlantRecord) -> Result<(), StoreError> {
        let bytes =
            serde_json::to_vec_pretty(record).map_err(|source| PersistenceError::Serialize {
                subject_id: subject_id.to_string(),
                source,
            })?;

        let path = self.record_path(subject_id);
        let tmp_path = path.with_extension("json.tmp");

        tokio::fs::write(&tmp_path, &bytes)
            .await
            .map_err(|source| PersistenceError::Write {
                subject_id: subject_id.to_string(),
                source,
            })?;

        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|source| PersistenceError::Write {
                subject_id: subject_id.to_string(),
                source,
            })?;

        Ok(())
    }

    /// List subjects with a record on disk, sorted by subject id
    /// Files that do not look like subject records are skipped
    pub async fn list_subjects(&self) -> Result<Vec<String>, StoreError> {
        let mut entries =
            tokio::fs::read_dir(&self.data_dir)
                .await
                .map_err(|source| PersistenceError::List {
                    path: self.data_dir.clone(),
                    source,
                })?;

        let mut subjects = Vec::new();
        loop {
            let entry = entries
                .next_entry()
                .await
                .map_err(|source| PersistenceError::List {
                    path: self.data_dir.clone(),
                    source,
                })?;
            let entry = match entry {
                Some(entry) => entry,
                None => break,
            };

            let file_name = entry.file_name();
            let subject_id = match file_name.to_str().and_then(subject_id_from_filename) {
                Some(subject_id) => subject_id,
                None => continue,
            };

            if validate_subject_id(subject_id).is_err() {
                warn!(
                    file = %file_name.to_string_lossy(),
                    "Skipping record file with unrecognized subject id"
                );
                continue;
            }

            subjects.push(subject_id.to_string());
        }

        subjects.sort();
        Ok(subjects)
    }
}

/// Extract the subject id from a record file name
fn subject_id_from_filename(name: &str) -> Option<&str> {
    name.strip_prefix(RECORD_PREFIX)?.strip_suffix(RECORD_SUFFIX)
}
