//! Battle feed ingestion: parse BattleRecords from JSON text or files.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::battle::record::BattleRecord;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("could not read battle file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid battle record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("battle record has an empty id")]
    MissingId,
}

/// Parse one battle record from JSON.
pub fn parse_battle_json(input: &str) -> Result<BattleRecord, IngestError> {
    let record: BattleRecord = serde_json::from_str(input)?;
    if record.id.trim().is_empty() {
        return Err(IngestError::MissingId);
    }
    tracing::debug!(
        target: "fleetview::battle",
        battle_id = %record.id,
        day = record.day.is_some(),
        night = record.night.is_some(),
        "battle.ingest.parsed"
    );
    Ok(record)
}

pub fn load_battle_file(path: &Path) -> Result<BattleRecord, IngestError> {
    let raw = fs::read_to_string(path).map_err(|source| IngestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_battle_json(&raw)
}

/// Load every `*.json` battle in `dir`, in file name order. Unreadable or invalid files are
/// logged and skipped; a missing directory yields no battles.
pub fn load_battle_dir(dir: &Path) -> Vec<BattleRecord> {
    let Ok(entries) = fs::read_dir(dir) else {
        tracing::info!(target: "fleetview::battle", dir = %dir.display(), "battle.dir.missing");
        return Vec::new();
    };
    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| match load_battle_file(path) {
            Ok(record) => Some(record),
            Err(err) => {
                tracing::warn!(
                    target: "fleetview::battle",
                    path = %path.display(),
                    error = %err,
                    "battle.ingest.skipped"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_record_gets_defaults() {
        let record = parse_battle_json(r#"{"id": "1-1-A"}"#).expect("parse");
        assert_eq!(record.fleet_id, 1);
        assert!(record.day.is_none());
        assert!(record.night.is_none());
    }

    #[test]
    fn blank_id_is_rejected() {
        assert!(matches!(
            parse_battle_json(r#"{"id": "  "}"#),
            Err(IngestError::MissingId)
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(parse_battle_json("{"), Err(IngestError::Parse(_))));
    }

    #[test]
    fn unknown_phase_kind_is_rejected() {
        let input = r#"{"id": "x", "day": {"phases": [{"kind": "boarding"}]}}"#;
        assert!(matches!(parse_battle_json(input), Err(IngestError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_battle_file(Path::new("/nonexistent/battle.json")).expect_err("missing");
        assert!(err.to_string().contains("/nonexistent/battle.json"));
    }

    #[test]
    fn missing_dir_is_empty() {
        assert!(load_battle_dir(Path::new("/nonexistent/battles")).is_empty());
    }
}
