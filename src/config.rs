//! Runtime configuration: YAML file plus environment overrides.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::battle::archive::DEFAULT_ARCHIVE_CAPACITY;
use crate::data::loader::DEFAULT_SNAPSHOT_PATH;

pub const CONFIG_PATH_ENV: &str = "FLEETVIEW_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "fleetview.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub snapshot_path: PathBuf,
    /// Battles found here are loaded into the archive at startup.
    pub battle_dir: Option<PathBuf>,
    pub archive_capacity: usize,
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set.
    pub log_filter: String,
    /// Built dashboard bundle served for non-API paths.
    pub static_dir: Option<PathBuf>,
    /// When set, `POST /api/sync` requires this token in the `x-sync-token` header.
    pub sync_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            battle_dir: None,
            archive_capacity: DEFAULT_ARCHIVE_CAPACITY,
            log_filter: "info".to_string(),
            static_dir: None,
            sync_token: None,
        }
    }
}

impl AppConfig {
    /// Parse a YAML config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Load from the file named by `FLEETVIEW_CONFIG` (or `fleetview.yaml`), then apply
    /// environment overrides. A missing file means defaults; an unreadable or invalid one
    /// is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        Ok(config.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply `FLEETVIEW_BIND`, `FLEETVIEW_SNAPSHOT`, `FLEETVIEW_LOG`, and
    /// `FLEETVIEW_SYNC_TOKEN` from `lookup`. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(bind) = get("FLEETVIEW_BIND") {
            self.bind_addr = bind;
        }
        if let Some(snapshot) = get("FLEETVIEW_SNAPSHOT") {
            self.snapshot_path = PathBuf::from(snapshot);
        }
        if let Some(filter) = get("FLEETVIEW_LOG") {
            self.log_filter = filter;
        }
        if let Some(token) = get("FLEETVIEW_SYNC_TOKEN") {
            self.sync_token = Some(token);
        }
        self
    }
}
