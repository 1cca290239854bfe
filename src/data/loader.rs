//! Load store snapshots from disk. Graceful fallback when the snapshot is missing.

use std::fs;
use std::path::Path;

use crate::data::store::{NormalizedStore, StoreError};

pub const DEFAULT_SNAPSHOT_PATH: &str = "data/snapshot.json";

/// Load a snapshot file. Read and parse failures are returned to the caller.
pub fn load_snapshot(path: &Path) -> Result<NormalizedStore, StoreError> {
    let raw = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    NormalizedStore::from_json_str(&raw)
}

/// Load a snapshot, or start from an empty store when the file is missing or unreadable.
/// The dashboard keeps working on an empty store; the sync feed fills it in.
pub fn load_snapshot_or_empty(path: &Path) -> NormalizedStore {
    if !path.exists() {
        tracing::info!(
            target: "fleetview::store",
            path = %path.display(),
            "snapshot.missing=empty_store"
        );
        return NormalizedStore::default();
    }
    match load_snapshot(path) {
        Ok(store) => {
            tracing::info!(
                target: "fleetview::store",
                path = %path.display(),
                ships = store.ships.len(),
                equipment = store.equipment.len(),
                fleets = store.fleets.len(),
                "snapshot.loaded"
            );
            store
        }
        Err(err) => {
            tracing::warn!(
                target: "fleetview::store",
                path = %path.display(),
                error = %err,
                "snapshot.load_failed"
            );
            NormalizedStore::default()
        }
    }
}

/// Write a snapshot as pretty JSON.
pub fn save_snapshot(path: &Path, store: &NormalizedStore) -> Result<(), StoreError> {
    let payload = serde_json::to_string_pretty(store)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }
    fs::write(path, payload).map_err(|source| StoreError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_path(name: &str) -> std::path::PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("fleetview-{name}-{stamp}.json"))
    }

    #[test]
    fn missing_snapshot_yields_empty_store() {
        let store = load_snapshot_or_empty(Path::new("does/not/exist.json"));
        assert!(store.ships.is_empty());
        assert!(load_snapshot(Path::new("does/not/exist.json")).is_err());
    }

    #[test]
    fn malformed_snapshot_is_a_parse_error() {
        let path = temp_path("malformed");
        fs::write(&path, "{ not json").expect("write temp file");
        assert!(matches!(load_snapshot(&path), Err(StoreError::Parse(_))));
        assert!(load_snapshot_or_empty(&path).fleets.is_empty());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_then_load_keeps_records() {
        let path = temp_path("roundtrip");
        let store = NormalizedStore::from_json_str(
            r#"{"fleets": [{"id": 1, "ship_ids": [4, 5]}], "combined": 2}"#,
        )
        .expect("parse");
        save_snapshot(&path, &store).expect("save");
        let loaded = load_snapshot(&path).expect("load");
        assert_eq!(loaded, store);
        let _ = fs::remove_file(&path);
    }
}
