//! Conversation history
//!
//! Saved transcripts live as JSON files in a single directory.

pub mod filename;
pub mod models;
pub mod store;

pub use models::{Message, MessageFormat, MessageKind, Role};
pub use store::{ConversationSummary, HistoryError, HistoryStore};
