//! Settings persistence module
//! Handles saving and loading the settings snapshot to/from a JSON file

use super::settings::Settings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Current version of the settings file format
const SETTINGS_FILE_VERSION: u32 = 1;

/// Error types for persistence operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceError {
    /// File I/O error
    IoError(String),
    /// JSON serialization/deserialization error
    JsonError(String),
    /// Invalid data format
    InvalidData(String),
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PersistenceError::IoError(msg) => write!(f, "IO Error: {}", msg),
            PersistenceError::JsonError(msg) => write!(f, "JSON Error: {}", msg),
            PersistenceError::InvalidData(msg) => write!(f, "Invalid Data: {}", msg),
        }
    }
}

impl std::error::Error for PersistenceError {}

/// On-disk layout of the settings file
#[derive(Debug, Serialize, Deserialize)]
struct SettingsFileData {
    /// Version of the file format (for future migration support)
    version: u32,
    /// The saved snapshot
    settings: Settings,
}

/// Sibling file a new snapshot is written to before it replaces `path`
fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

/// Settings file persistence operations
pub struct SettingsFile;

impl SettingsFile {
    /// Save a snapshot to a JSON file, creating parent directories
    ///
    /// The snapshot is written to a temporary sibling and renamed over the
    /// target, so a failed write leaves the previous file intact.
    pub async fn save_to_file<P: AsRef<Path>>(
        settings: &Settings,
        path: P,
    ) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        let data = SettingsFileData {
            version: SETTINGS_FILE_VERSION,
            settings: settings.clone(),
        };

        let json = serde_json::to_string_pretty(&data)
            .map_err(|e| PersistenceError::JsonError(e.to_string()))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| PersistenceError::IoError(e.to_string()))?;
            }
        }

        let temp = temp_path(path);
        if let Err(e) = fs::write(&temp, json).await {
            discard_temp(&temp).await;
            return Err(PersistenceError::IoError(e.to_string()));
        }
        if let Err(e) = fs::rename(&temp, path).await {
            discard_temp(&temp).await;
            return Err(PersistenceError::IoError(e.to_string()));
        }

        debug!(path = %path.display(), "Settings file written");
        Ok(())
    }

    /// Load a snapshot from a JSON file
    ///
    /// Returns `Ok(None)` when the file does not exist yet.
    pub async fn load_from_file<P: AsRef<Path>>(
        path: P,
    ) -> Result<Option<Settings>, PersistenceError> {
        let path = path.as_ref();
        let json = match fs::read_to_string(path).await {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(PersistenceError::IoError(e.to_string())),
        };

        let data: SettingsFileData =
            serde_json::from_str(&json).map_err(|e| PersistenceError::JsonError(e.to_string()))?;

        if data.version != SETTINGS_FILE_VERSION {
            return Err(PersistenceError::InvalidData(format!(
                "Unsupported settings file version: {}",
                data.version
            )));
        }

        data.settings
            .validate()
            .map_err(|e| PersistenceError::InvalidData(e.to_string()))?;

        Ok(Some(data.settings))
    }
}

async fn discard_temp(temp: &Path) {
    if let Err(e) = fs::remove_file(temp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %temp.display(), error = %e, "Failed to remove temporary settings file");
        }
    }
}
