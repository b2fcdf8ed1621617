//! Lifecycle Module Tests

#[cfg(test)]
mod tests {
    use crate::lifecycle::{ExitReason, flush_on_exit};
    use crate::persistence::DataStore;
    use serde_json::{Value, json};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_flush_writes_current_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        let store = DataStore::new(&path);
        store.load();
        let record = match json!({"Status": "Open"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        store.replace_all(vec![record]).unwrap();
        // Simulate the file vanishing while the process was running.
        fs::remove_file(&path).unwrap();

        assert!(flush_on_exit(&store, ExitReason::Signal));

        let on_disk: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!([{"Status": "Open"}]));
        assert_eq!(store.version(), 3);
    }

    #[test]
    fn test_flush_failure_is_reported_not_raised() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.json");
        fs::create_dir(&path).unwrap();
        let store = DataStore::new(&path);

        assert!(!flush_on_exit(&store, ExitReason::Fatal));
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitReason::Signal.exit_code(), 0);
        assert_eq!(ExitReason::Fatal.exit_code(), 1);
    }
}
