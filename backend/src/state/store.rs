//! Process-wide settings store
//!
//! Single owner of the live settings snapshot. HTTP handlers and every relay
//! session read and replace settings only through this interface. Writes are
//! whole-snapshot and last-write-wins.

use super::persistence::SettingsFile;
use super::settings::{Settings, SettingsError};
use serde_json::Value;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Shared settings snapshot with optional file backing
#[derive(Debug)]
pub struct SettingsStore {
    current: RwLock<Settings>,
    file: Option<PathBuf>,
}

impl SettingsStore {
    /// Create a store seeded with `initial`
    ///
    /// When `file` is set, every successful `set`/`reset` rewrites it.
    pub fn new(initial: Settings, file: Option<PathBuf>) -> Self {
        Self {
            current: RwLock::new(initial),
            file,
        }
    }

    /// Create a store with defaults and no file backing
    pub fn in_memory() -> Self {
        Self::new(Settings::default(), None)
    }

    /// Current snapshot
    pub async fn get(&self) -> Settings {
        self.current.read().await.clone()
    }

    /// Validate and replace the whole snapshot
    pub async fn set(&self, settings: Settings) -> Result<(), SettingsError> {
        settings.validate()?;

        let mut current = self.current.write().await;
        if let Some(path) = &self.file {
            SettingsFile::save_to_file(&settings, path).await?;
            debug!(path = %path.display(), "Settings written to file");
        }
        *current = settings;
        info!(model = %current.model, auto_run = current.auto_run, "Settings replaced");
        Ok(())
    }

    /// Parse a JSON object (missing keys take defaults) and replace the snapshot
    pub async fn set_value(&self, value: Value) -> Result<(), SettingsError> {
        let settings = Settings::from_value(value)?;
        self.set(settings).await
    }

    /// Restore the static defaults and return them
    pub async fn reset(&self) -> Result<Settings, SettingsError> {
        let defaults = Settings::default();
        self.set(defaults.clone()).await?;
        info!("Settings reset to defaults");
        Ok(defaults)
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
