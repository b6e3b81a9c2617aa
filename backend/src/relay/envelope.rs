//! Live channel envelopes
//!
//! Every frame on the WebSocket is one JSON object tagged by `type`.

use crate::history::{MessageFormat, Role};
use crate::interpreter::Chunk;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status sent when a turn completes
pub const STATUS_DONE: &str = "done";

/// Envelope sent by the browser
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    /// Run one chat turn
    Chat {
        /// User text
        message: String,
        /// Settings to apply before the turn (absent or empty = keep current)
        #[serde(default)]
        settings: Option<Value>,
    },
    /// Run a code block directly
    Execute {
        /// Language of the block
        language: String,
        /// Source to run
        code: String,
    },
    /// Save the transcript, then start over
    NewChat,
    /// Start over without saving
    ClearChat,
    /// Replace the settings snapshot
    UpdateSettings {
        /// New snapshot; omitted keys take defaults
        settings: Value,
    },
}

impl Inbound {
    /// Envelope type name, for logs
    pub fn kind(&self) -> &'static str {
        match self {
            Inbound::Chat { .. } => "chat",
            Inbound::Execute { .. } => "execute",
            Inbound::NewChat => "new_chat",
            Inbound::ClearChat => "clear_chat",
            Inbound::UpdateSettings { .. } => "update_settings",
        }
    }
}

/// Envelope sent to the browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outbound {
    /// Prose (or console output) to append to the transcript
    Message {
        /// Sender role
        role: Role,
        /// Text delta
        content: String,
        /// Rendering hint
        format: MessageFormat,
    },
    /// Code delta
    Code {
        /// Language of the block
        language: String,
        /// Code delta
        content: String,
    },
    /// Free-form status, `done` at the end of a turn
    Status {
        /// Status text
        content: String,
    },
    /// Human-readable failure
    Error {
        /// Error text
        content: String,
    },
}

impl Outbound {
    /// Status envelope
    pub fn status(content: impl Into<String>) -> Self {
        Outbound::Status {
            content: content.into(),
        }
    }

    /// Error envelope
    pub fn error(content: impl Into<String>) -> Self {
        Outbound::Error {
            content: content.into(),
        }
    }
}

impl From<Chunk> for Outbound {
    fn from(chunk: Chunk) -> Self {
        match chunk {
            Chunk::Message {
                role,
                content,
                format,
            } => Outbound::Message {
                role,
                content,
                format,
            },
            Chunk::Code { language, content } => Outbound::Code { language, content },
            Chunk::Console { content } => Outbound::Message {
                role: Role::Assistant,
                content,
                format: MessageFormat::Text,
            },
        }
    }
}
