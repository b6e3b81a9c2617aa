//! In-memory transcript of one session
//!
//! Streamed chunks arrive as deltas. Consecutive deltas of the same role,
//! kind and format are joined into one message, which is the shape saved to
//! the history directory.

use crate::history::{Message, MessageKind, Role};
use crate::interpreter::Chunk;

/// Ordered messages of the current conversation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a user message; never merged with a previous one
    pub fn push_user(&mut self, content: &str) {
        self.messages.push(Message::user(content));
    }

    /// Append a code block submitted for direct execution
    pub fn push_user_code(&mut self, language: &str, code: &str) {
        self.messages.push(Message::code(Role::User, language, code));
    }

    /// Append a streamed chunk, extending the last message when it continues it
    pub fn push_chunk(&mut self, chunk: &Chunk) {
        let incoming = match chunk {
            Chunk::Message {
                role,
                content,
                format,
            } => Message::text(*role, content.as_str(), *format),
            Chunk::Code { language, content } => {
                Message::code(Role::Assistant, language.as_str(), content.as_str())
            }
            Chunk::Console { content } => Message::console(content.as_str()),
        };

        match self.messages.last_mut() {
            Some(last) if continues(last, &incoming) => last.content.push_str(&incoming.content),
            _ => self.messages.push(incoming),
        }
    }

    /// Messages in order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether nothing has been said yet
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

fn continues(last: &Message, incoming: &Message) -> bool {
    last.role != Role::User
        && last.role == incoming.role
        && last.kind == incoming.kind
        && last.format == incoming.format
        && last.kind != MessageKind::Image
}
