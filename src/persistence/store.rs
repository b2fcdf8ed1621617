use super::atomic::{backup_corrupt, write_json_atomic};
use super::types::{FileStats, LoadOutcome, PersistError, Record, Snapshot};

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// The process-wide dataset and its durable mirror.
///
/// There is exactly one way to change the data (`replace_all`) and one way to
/// read it (`snapshot`). Every write goes through the atomic writer, and the
/// mutex serializes request-driven saves against the shutdown flush.
pub struct DataStore {
    path: PathBuf,
    backup_dir: Option<PathBuf>,
    state: Mutex<StoreState>,
}

struct StoreState {
    records: Arc<Vec<Record>>,
    version: u64,
}

enum Parsed {
    Array(Vec<Record>),
    Single(Record),
    /// Object elements in order, plus the indices of the elements that were not objects.
    Mixed(Vec<Record>, Vec<usize>),
}

impl DataStore {
    /// Creates an empty store at version 0. Nothing is read until `load()`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_dir: None,
            state: Mutex::new(StoreState {
                records: Arc::new(Vec::new()),
                version: 0,
            }),
        }
    }

    /// Writes corrupt-file backups into `dir` instead of beside the data file.
    pub fn with_backup_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.backup_dir = Some(dir.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the backing file into memory, repairing it if necessary.
    ///
    /// Always leaves a valid JSON array on disk (unless the disk itself refuses
    /// the write, which is logged) and always bumps the version by one.
    pub fn load(&self) -> LoadOutcome {
        let mut state = self.lock();

        let (records, outcome) = match fs::read(&self.path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(
                    "No data file at {}, creating an empty one",
                    self.path.display()
                );
                self.write_during_load(&[]);
                (Vec::new(), LoadOutcome::Created)
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.path.display(), e);
                (Vec::new(), self.recover())
            }
            Ok(bytes) => match parse_dataset(&bytes) {
                Ok(Parsed::Array(records)) => {
                    let count = records.len();
                    (records, LoadOutcome::Loaded { records: count })
                }
                Ok(Parsed::Single(record)) => {
                    tracing::warn!(
                        "{} holds a single object, upgrading it to a one-element array",
                        self.path.display()
                    );
                    let records = vec![record];
                    self.write_during_load(&records);
                    (records, LoadOutcome::Upgraded)
                }
                Ok(Parsed::Mixed(records, dropped)) => {
                    tracing::warn!(
                        "{} holds non-object elements at indices {:?}, keeping the {} objects",
                        self.path.display(),
                        dropped,
                        records.len()
                    );
                    let backup = self.backup();
                    self.write_during_load(&records);
                    let count = records.len();
                    (
                        records,
                        LoadOutcome::Pruned {
                            records: count,
                            dropped,
                            backup,
                        },
                    )
                }
                Err(reason) => {
                    tracing::error!("Data file {} is corrupt: {}", self.path.display(), reason);
                    (Vec::new(), self.recover())
                }
            },
        };

        tracing::info!(
            "Loaded {} records from {}",
            records.len(),
            self.path.display()
        );
        state.records = Arc::new(records);
        state.version += 1;
        outcome
    }

    /// Persists the current in-memory dataset. Returns the new version.
    pub fn save(&self) -> Result<u64, PersistError> {
        let mut state = self.lock();
        self.persist(&state.records)?;
        state.version += 1;
        Ok(state.version)
    }

    /// Replaces the whole dataset and persists it. Returns the new version.
    ///
    /// Memory is only swapped once the file is safely on disk; a failed write
    /// leaves both the file and the in-memory dataset at their previous state.
    pub fn replace_all(&self, records: Vec<Record>) -> Result<u64, PersistError> {
        let mut state = self.lock();
        self.persist(&records)?;
        state.records = Arc::new(records);
        state.version += 1;
        Ok(state.version)
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.lock();
        Snapshot {
            records: Arc::clone(&state.records),
            version: state.version,
        }
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size and mtime of the backing file, `None` if it cannot be stat'ed.
    pub fn file_stats(&self) -> Option<FileStats> {
        let metadata = fs::metadata(&self.path).ok()?;
        Some(FileStats {
            size_bytes: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    fn persist(&self, records: &[Record]) -> Result<(), PersistError> {
        match write_json_atomic(&self.path, records) {
            Ok(()) => {
                tracing::info!(
                    "Saved {} records to {}",
                    records.len(),
                    self.path.display()
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to save {}: {}", self.path.display(), e);
                Err(e)
            }
        }
    }

    fn write_during_load(&self, records: &[Record]) {
        // load() must not fail; persist() already logged the error.
        let _ = self.persist(records);
    }

    fn recover(&self) -> LoadOutcome {
        let backup = self.backup();
        self.write_during_load(&[]);
        LoadOutcome::Recovered { backup }
    }

    fn backup(&self) -> Option<PathBuf> {
        match backup_corrupt(&self.path, self.backup_dir.as_deref()) {
            Ok(backup) => {
                tracing::warn!("Backed up data file to {}", backup.display());
                Some(backup)
            }
            Err(e) => {
                tracing::error!("Failed to back up data file: {}", e);
                None
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panic while holding the lock cannot leave the state half-updated:
        // records and version are only assigned after the write succeeds.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn parse_dataset(bytes: &[u8]) -> Result<Parsed, String> {
    let value: Value = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;

    match value {
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            let mut dropped = Vec::new();
            for (index, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(record) => records.push(record),
                    _ => dropped.push(index),
                }
            }
            if dropped.is_empty() {
                Ok(Parsed::Array(records))
            } else {
                Ok(Parsed::Mixed(records, dropped))
            }
        }
        Value::Object(record) => Ok(Parsed::Single(record)),
        other => Err(format!("top-level value is {}", json_kind(&other))),
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
