//! Persistence Module Tests
//!
//! Validates the durability contract of the data file.
//!
//! ## Test Scopes
//! - **Load**: missing file, valid array, single-object upgrade, mixed arrays, corrupt file
//!   recovery (including a failed backup).
//! - **Save**: round-trip fidelity (including key order), failure handling, temp cleanup.
//! - **Atomicity**: an interrupted save (temp staged, never renamed) leaves the file untouched.
//! - **Versioning**: one bump per load and per successful save, never on failure.

#[cfg(test)]
mod tests {
    use crate::persistence::atomic::{commit, stage_temp, write_json_atomic};
    use crate::persistence::{DataStore, LoadOutcome, Record};
    use serde_json::{Value, json};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {}", other),
        }
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    fn leftover_temp_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|name| name.ends_with(".tmp"))
            .collect()
    }

    // ============================================================
    // LOAD
    // ============================================================

    #[test]
    fn test_load_missing_file_creates_empty_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);

        let outcome = store.load();

        assert_eq!(outcome, LoadOutcome::Created);
        assert!(store.is_empty());
        assert_eq!(read_json(&path), json!([]));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_load_missing_file_in_missing_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state").join("data.json");
        let store = DataStore::new(&path);

        assert_eq!(store.load(), LoadOutcome::Created);
        assert_eq!(read_json(&path), json!([]));
    }

    #[test]
    fn test_load_valid_array() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"[{"Status":"Open"},{"Status":"Closed","n":2}]"#).unwrap();
        let store = DataStore::new(&path);

        let outcome = store.load();

        assert_eq!(outcome, LoadOutcome::Loaded { records: 2 });
        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.records[1]["n"], json!(2));
        assert_eq!(snapshot.version, 1);
    }

    #[test]
    fn test_load_single_object_is_wrapped_and_rewritten() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, r#"{"Status":"Open"}"#).unwrap();
        let store = DataStore::new(&path);

        let outcome = store.load();

        assert_eq!(outcome, LoadOutcome::Upgraded);
        assert_eq!(store.len(), 1);
        assert_eq!(read_json(&path), json!([{"Status": "Open"}]));
        // The upgrade write does not count as a separate save.
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_load_corrupt_file_is_backed_up_and_reset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let garbage = b"[{\"Status\": \"Open\",,,";
        fs::write(&path, garbage).unwrap();
        let store = DataStore::new(&path);

        let outcome = store.load();

        let backup = match outcome {
            LoadOutcome::Recovered { backup: Some(backup) } => backup,
            other => panic!("expected recovery with backup, got {:?}", other),
        };
        assert!(store.is_empty());
        assert_eq!(read_json(&path), json!([]));
        assert_eq!(fs::read(&backup).unwrap(), garbage);
        assert_eq!(backup.parent(), path.parent());
        let backup_name = backup.file_name().unwrap().to_string_lossy().to_string();
        assert!(backup_name.starts_with("data.json.corrupt-"));
        assert!(backup_name.ends_with(".bak"));
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_load_rejects_scalars_and_null() {
        for content in ["null", "42", "\"text\"", "true"] {
            let dir = TempDir::new().unwrap();
            let path = dir.path().join("data.json");
            fs::write(&path, content).unwrap();
            let store = DataStore::new(&path);

            let outcome = store.load();

            assert!(
                matches!(outcome, LoadOutcome::Recovered { backup: Some(_) }),
                "content {} should be treated as corrupt",
                content
            );
            assert!(store.is_empty());
            assert_eq!(read_json(&path), json!([]));
        }
    }

    #[test]
    fn test_load_array_with_non_object_elements_keeps_the_objects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let original = r#"[{"Status":"Open"},{"Status":"Closed"}, 7, null]"#;
        fs::write(&path, original).unwrap();
        let store = DataStore::new(&path);

        let outcome = store.load();

        let backup = match outcome {
            LoadOutcome::Pruned {
                records: 2,
                dropped,
                backup: Some(backup),
            } => {
                assert_eq!(dropped, vec![2, 3]);
                backup
            }
            other => panic!("expected pruned load with backup, got {:?}", other),
        };
        assert_eq!(fs::read_to_string(&backup).unwrap(), original);
        assert_eq!(store.len(), 2);
        assert_eq!(
            read_json(&path),
            json!([{"Status": "Open"}, {"Status": "Closed"}])
        );
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn test_load_survives_failed_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, b"{ not json").unwrap();
        // A regular file where the backup directory should be.
        let blocked = dir.path().join("backups");
        fs::write(&blocked, b"").unwrap();
        let store = DataStore::new(&path).with_backup_dir(&blocked);

        let outcome = store.load();

        assert_eq!(outcome, LoadOutcome::Recovered { backup: None });
        assert!(store.is_empty());
        assert_eq!(read_json(&path), json!([]));
        assert_eq!(store.version(), 1);
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[test]
    fn test_backups_go_to_configured_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::write(&path, b"[1,").unwrap();
        let backups = dir.path().join("backups");
        let store = DataStore::new(&path).with_backup_dir(&backups);

        let backup = match store.load() {
            LoadOutcome::Recovered { backup: Some(backup) } => backup,
            other => panic!("expected recovery with backup, got {:?}", other),
        };

        assert_eq!(backup.parent(), Some(backups.as_path()));
        assert_eq!(fs::read(&backup).unwrap(), b"[1,");
        assert_eq!(read_json(&path), json!([]));
    }

    // ============================================================
    // SAVE / ROUND-TRIP
    // ============================================================

    #[test]
    fn test_replace_then_load_round_trip_preserves_key_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);
        store.load();

        let records = vec![
            record(json!({"zeta": 1, "alpha": "two", "mid": [1, 2, {"x": null}]})),
            record(json!({"Status": "Closed", "nested": {"b": true, "a": 1.5}})),
        ];
        store.replace_all(records.clone()).unwrap();

        let reloaded = DataStore::new(&path);
        reloaded.load();
        let snapshot = reloaded.snapshot();

        assert_eq!(*snapshot.records, records);
        let keys: Vec<&String> = snapshot.records[0].keys().collect();
        assert_eq!(keys, ["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_saved_file_is_pretty_printed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);

        store.replace_all(vec![record(json!({"a": 1}))]).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "[\n  {\n    \"a\": 1\n  }\n]");
    }

    #[test]
    fn test_save_flushes_current_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);
        store.load();
        store.replace_all(vec![record(json!({"a": 1}))]).unwrap();
        fs::remove_file(&path).unwrap();

        let version = store.save().unwrap();

        assert_eq!(version, 3);
        assert_eq!(read_json(&path), json!([{"a": 1}]));
    }

    #[test]
    fn test_failed_replace_keeps_memory_and_version() {
        let dir = TempDir::new().unwrap();
        // A directory where the data file should be makes the rename fail.
        let path = dir.path().join("data.json");
        fs::create_dir(&path).unwrap();
        let store = DataStore::new(&path);

        let result = store.replace_all(vec![record(json!({"a": 1}))]);

        assert!(result.is_err());
        assert!(store.is_empty());
        assert_eq!(store.version(), 0);
        assert!(leftover_temp_files(dir.path()).is_empty());
        assert!(store.save().is_err());
        assert_eq!(store.version(), 0);
    }

    // ============================================================
    // ATOMICITY
    // ============================================================

    #[test]
    fn test_interrupted_save_leaves_original_intact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        write_json_atomic(&path, &json!([{"v": 1}])).unwrap();
        let before = fs::read(&path).unwrap();

        // Crash after staging, before the rename.
        let tmp = stage_temp(&path, br#"[{"v": 2}]"#).unwrap();

        assert!(tmp.exists());
        assert_eq!(tmp.parent(), path.parent());
        assert_eq!(fs::read(&path).unwrap(), before);

        let store = DataStore::new(&path);
        assert_eq!(store.load(), LoadOutcome::Loaded { records: 1 });
        assert_eq!(store.snapshot().records[0]["v"], json!(1));

        // Completing the interrupted write swaps the content in one step.
        commit(&tmp, &path).unwrap();
        assert_eq!(read_json(&path), json!([{"v": 2}]));
        assert!(!tmp.exists());
    }

    #[test]
    fn test_successful_save_leaves_no_temp_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);

        for i in 0..5 {
            store.replace_all(vec![record(json!({"i": i}))]).unwrap();
        }

        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    // ============================================================
    // VERSIONING
    // ============================================================

    #[test]
    fn test_version_increments_once_per_successful_call() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);
        assert_eq!(store.version(), 0);

        store.load();
        assert_eq!(store.version(), 1);

        let mut last = store.version();
        for i in 0..10 {
            let version = if i % 2 == 0 {
                store.replace_all(vec![record(json!({"i": i}))]).unwrap()
            } else {
                store.save().unwrap()
            };
            assert_eq!(version, last + 1);
            last = version;
        }

        store.load();
        assert_eq!(store.version(), last + 1);
    }

    #[test]
    fn test_snapshot_is_isolated_from_later_replace() {
        let dir = TempDir::new().unwrap();
        let store = DataStore::new(dir.path().join("data.json"));
        store.replace_all(vec![record(json!({"a": 1}))]).unwrap();

        let before = store.snapshot();
        store.replace_all(Vec::new()).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(before.version, 1);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_file_stats_reports_size() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);
        assert!(store.file_stats().is_none());

        store.load();
        let stats = store.file_stats().unwrap();
        assert_eq!(stats.size_bytes, fs::metadata(&path).unwrap().len());
        assert!(stats.modified.is_some());
    }
}
