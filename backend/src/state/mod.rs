// State management module
// Handles the shared application context, settings snapshot, and persistence

pub mod app_state;
pub mod persistence;
pub mod settings;
pub mod store;

pub use app_state::AppState;
pub use persistence::PersistenceError;
pub use settings::{SafeMode, Settings, SettingsError};
pub use store::SettingsStore;
