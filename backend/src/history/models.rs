//! Conversation data models
//!
//! Defines the message shape shared by saved conversation files, the live
//! transcript and the interpreter bridge.

use serde::{Deserialize, Serialize};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message from the user
    User,
    /// Message from the assistant/AI
    Assistant,
    /// Message from the system or the execution environment
    #[serde(alias = "computer")]
    System,
}

/// Rendering hint for message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// Plain text, rendered verbatim
    #[default]
    Text,
    /// Markdown, rendered to HTML by the client
    Markdown,
}

impl MessageFormat {
    /// Convert the format to its string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageFormat::Text => "text",
            MessageFormat::Markdown => "markdown",
        }
    }
}

/// What a message carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Prose
    #[default]
    Message,
    /// Source code; `format` holds the language
    Code,
    /// Output of executed code
    Console,
    /// Image payload
    Image,
    /// Anything else the interpreter wrote
    #[serde(other)]
    Other,
}

/// A single message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender
    pub role: Role,
    /// Kind of content
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    /// `text`/`markdown` for prose, the language for code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Content of the message
    #[serde(default)]
    pub content: String,
}

impl Message {
    /// Create a prose message
    pub fn text(role: Role, content: impl Into<String>, format: MessageFormat) -> Self {
        Self {
            role,
            kind: MessageKind::Message,
            format: Some(format.as_str().to_string()),
            content: content.into(),
        }
    }

    /// Create a plain-text user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::text(Role::User, content, MessageFormat::Text)
    }

    /// Create a code message
    pub fn code(role: Role, language: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role,
            kind: MessageKind::Code,
            format: Some(language.into()),
            content: content.into(),
        }
    }

    /// Create a console output message
    pub fn console(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            kind: MessageKind::Console,
            format: None,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_value(Role::User).unwrap(), json!("user"));
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), json!("assistant"));
        assert_eq!(serde_json::to_value(Role::System).unwrap(), json!("system"));
    }

    #[test]
    fn test_message_parses_interpreter_files() {
        let raw = json!([
            {"role": "user", "type": "message", "content": "list files"},
            {"role": "assistant", "type": "code", "format": "python", "content": "import os"},
            {"role": "computer", "type": "console", "format": "output", "content": "a.txt"},
            {"role": "assistant", "type": "image", "format": "base64.png", "content": "iVBOR"},
            {"role": "assistant", "type": "confirmation", "content": ""}
        ]);
        let messages: Vec<Message> = serde_json::from_value(raw).unwrap();

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].kind, MessageKind::Message);
        assert_eq!(messages[1].format.as_deref(), Some("python"));
        assert_eq!(messages[2].role, Role::System);
        assert_eq!(messages[3].kind, MessageKind::Image);
        assert_eq!(messages[4].kind, MessageKind::Other);
    }

    #[test]
    fn test_message_defaults_when_fields_missing() {
        let message: Message = serde_json::from_value(json!({"role": "assistant"})).unwrap();
        assert_eq!(message.kind, MessageKind::Message);
        assert!(message.format.is_none());
        assert!(message.content.is_empty());
    }

    #[test]
    fn test_message_serialization_shape() {
        let value = serde_json::to_value(Message::code(Role::Assistant, "python", "print(1)")).unwrap();
        assert_eq!(
            value,
            json!({"role": "assistant", "type": "code", "format": "python", "content": "print(1)"})
        );

        let value = serde_json::to_value(Message::console("1")).unwrap();
        assert!(value.get("format").is_none());
    }
}
