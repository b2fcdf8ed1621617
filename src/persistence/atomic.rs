//! Crash-safe file replacement.
//!
//! `write_json_atomic` is split into `stage_temp` and `commit` so the window
//! between the two can be exercised directly.

use super::types::PersistError;

use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serializes `value` as pretty JSON (two-space indent) and atomically replaces `path`.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    write_bytes_atomic(path, &bytes)
}

pub fn write_bytes_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistError> {
    let tmp = stage_temp(path, bytes)?;
    commit(&tmp, path)
}

/// Writes `bytes` to a fresh temp file next to `path` and fsyncs it.
///
/// The temp file lives in the same directory so the later rename never crosses
/// a filesystem boundary. On failure the partial temp file is removed.
pub fn stage_temp(path: &Path, bytes: &[u8]) -> Result<PathBuf, PersistError> {
    let tmp = temp_path_for(path)?;
    if let Some(parent) = non_empty_parent(path) {
        fs::create_dir_all(parent).map_err(|e| PersistError::io("create directory", parent, e))?;
    }

    let written = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .map_err(|e| PersistError::io("write temp file", &tmp, e));

    if let Err(e) = written {
        discard_temp(&tmp);
        return Err(e);
    }

    Ok(tmp)
}

/// Renames a staged temp file over `path`, then fsyncs the directory (best-effort).
pub fn commit(tmp: &Path, path: &Path) -> Result<(), PersistError> {
    if let Err(e) = fs::rename(tmp, path) {
        discard_temp(tmp);
        return Err(PersistError::io("rename temp file onto", path, e));
    }

    if let Some(parent) = non_empty_parent(path) {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

/// Copies a backing file to `<name>.corrupt-<timestamp>.bak`, beside it or in
/// `backup_dir` when one is given.
pub fn backup_corrupt(path: &Path, backup_dir: Option<&Path>) -> Result<PathBuf, PersistError> {
    let name = file_name(path)?;
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%3fZ");
    let backup_name = format!("{}.corrupt-{}.bak", name, stamp);
    let backup = match backup_dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| PersistError::io("create directory", dir, e))?;
            dir.join(backup_name)
        }
        None => path.with_file_name(backup_name),
    };

    fs::copy(path, &backup).map_err(|e| PersistError::io("back up", &backup, e))?;
    Ok(backup)
}

pub(crate) fn temp_path_for(path: &Path) -> Result<PathBuf, PersistError> {
    let name = file_name(path)?;
    Ok(path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple())))
}

fn discard_temp(tmp: &Path) {
    if tmp.exists() {
        if let Err(e) = fs::remove_file(tmp) {
            tracing::warn!("Failed to remove temp file {}: {}", tmp.display(), e);
        }
    }
}

fn file_name(path: &Path) -> Result<String, PersistError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| PersistError::InvalidPath(path.to_path_buf()))
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}
