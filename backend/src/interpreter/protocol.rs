//! Bridge wire protocol
//!
//! Newline-delimited JSON between this server and the interpreter bridge
//! process. Each request is answered by zero or more output events followed by
//! exactly one `done` or `error`.

use super::Chunk;
use crate::history::{MessageFormat, Role};
use crate::state::Settings;
use serde::{Deserialize, Serialize};

/// Request written to the bridge's stdin
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeRequest<'a> {
    /// Run one chat turn
    Chat {
        /// User text
        message: &'a str,
        /// Settings in effect for this turn
        settings: &'a Settings,
    },
    /// Run a code block directly
    Execute {
        /// Language of the block
        language: &'a str,
        /// Source to run
        code: &'a str,
        /// Settings in effect for this run
        settings: &'a Settings,
    },
    /// Drop the interpreter's in-memory conversation
    Reset,
}

fn default_role() -> Role {
    Role::Assistant
}

fn default_language() -> String {
    "python".to_string()
}

/// Event read from the bridge's stdout
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BridgeEvent {
    /// Prose from the model
    Message {
        /// Sender role
        #[serde(default = "default_role")]
        role: Role,
        /// Text delta
        #[serde(default)]
        content: String,
        /// Rendering hint
        #[serde(default)]
        format: MessageFormat,
    },
    /// Code the model wrote
    Code {
        /// Language of the block
        #[serde(default = "default_language")]
        language: String,
        /// Code delta
        #[serde(default)]
        content: String,
    },
    /// Output of executed code
    Console {
        /// Output delta
        #[serde(default)]
        content: String,
    },
    /// Request finished successfully
    Done,
    /// Request failed
    Error {
        /// Human-readable cause
        #[serde(default)]
        message: String,
    },
    /// Any other event type, such as a confirmation prompt or an image;
    /// skipped without ending the turn
    #[serde(other)]
    Unknown,
}

impl BridgeEvent {
    /// Output chunk carried by this event, if any
    pub fn into_chunk(self) -> Option<Chunk> {
        match self {
            BridgeEvent::Message {
                role,
                content,
                format,
            } => Some(Chunk::Message {
                role,
                content,
                format,
            }),
            BridgeEvent::Code { language, content } => Some(Chunk::Code { language, content }),
            BridgeEvent::Console { content } => Some(Chunk::Console { content }),
            BridgeEvent::Done | BridgeEvent::Error { .. } | BridgeEvent::Unknown => None,
        }
    }
}
