//! API module
//! HTTP handlers for settings, conversation history, uploads and the embedded client

pub mod assets;
pub mod history;
pub mod settings;
pub mod upload;

pub use assets::{app_js, health_check, index, style_css};
pub use history::{
    delete_all_conversations, delete_conversation, list_conversations, load_conversation,
};
pub use settings::{get_settings, reset_settings, save_settings};
pub use upload::upload_files;
