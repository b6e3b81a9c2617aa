//! Application state shared by HTTP handlers and live sessions

use super::store::SettingsStore;
use crate::config::Config;
use crate::history::HistoryStore;
use crate::interpreter::{BridgeFactory, InterpreterFactory};
use std::path::PathBuf;
use std::sync::Arc;

/// Main application state
///
/// Cheap to clone; every field is shared. Per-connection state (transcript,
/// interpreter) lives in `relay::Session`, not here.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide settings snapshot
    pub settings: Arc<SettingsStore>,
    /// Saved conversations
    pub history: Arc<HistoryStore>,
    /// Creates one interpreter per live session
    pub interpreters: Arc<dyn InterpreterFactory>,
    /// Directory uploaded files are written to
    pub upload_dir: PathBuf,
}

impl AppState {
    /// Assemble state from its parts
    pub fn new(
        settings: Arc<SettingsStore>,
        history: Arc<HistoryStore>,
        interpreters: Arc<dyn InterpreterFactory>,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            settings,
            history,
            interpreters,
            upload_dir: upload_dir.into(),
        }
    }

    /// State wired to the bridge interpreter described by `config`
    pub fn from_config(config: &Config, settings: SettingsStore) -> Self {
        Self::new(
            Arc::new(settings),
            Arc::new(HistoryStore::new(config.storage.history_dir.clone())),
            Arc::new(BridgeFactory::new(&config.bridge)),
            config.storage.upload_dir.clone(),
        )
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("settings", &self.settings)
            .field("history", &self.history)
            .field("upload_dir", &self.upload_dir)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_from_config_uses_storage_paths() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.storage.history_dir = dir.path().join("conversations");
        config.storage.upload_dir = dir.path().join("uploads");

        let state = AppState::from_config(&config, SettingsStore::in_memory());
        state.history.save_as("check.json", &[]).await.unwrap();
        assert!(dir.path().join("conversations").join("check.json").exists());
        assert_eq!(state.upload_dir, dir.path().join("uploads"));
        assert_eq!(state.settings.get().await.model, "gpt-4o");

        // Clones share the same stores
        let clone = state.clone();
        assert!(Arc::ptr_eq(&clone.settings, &state.settings));
    }
}
