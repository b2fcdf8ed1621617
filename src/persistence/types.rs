use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;

/// One dataset entry: an open-ended JSON object.
///
/// Keys keep their insertion order (serde_json `preserve_order`), so a record
/// written back to disk looks exactly like the one the client sent.
pub type Record = Map<String, Value>;

/// Read-only view of the dataset at a given version.
///
/// Cloning is cheap: the records are shared behind an `Arc` and replaced
/// wholesale on every save, never patched in place.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Arc<Vec<Record>>,
    pub version: u64,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// What `DataStore::load` found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No backing file existed; an empty one was written.
    Created,
    /// The file held a valid array.
    Loaded { records: usize },
    /// The file held a single object, now stored as a one-element array.
    Upgraded,
    /// The file held an array with non-object elements. The original was
    /// backed up (when possible) and the object elements were kept.
    Pruned {
        records: usize,
        dropped: Vec<usize>,
        backup: Option<PathBuf>,
    },
    /// The file was unreadable; it was backed up (when possible) and reset.
    Recovered { backup: Option<PathBuf> },
}

/// Size and modification time of the backing file.
#[derive(Debug, Clone)]
pub struct FileStats {
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("failed to serialize dataset: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to {op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("backing file path {0} has no file name")]
    InvalidPath(PathBuf),
}

impl PersistError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}
