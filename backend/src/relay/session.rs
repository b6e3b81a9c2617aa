//! Relay session
//!
//! One session per connected browser tab. Inbound envelopes are handled one
//! at a time: `handle_text` returns only after every outbound envelope caused
//! by its input has been queued, so turns never interleave.

use super::envelope::{Inbound, Outbound, STATUS_DONE};
use super::transcript::Transcript;
use super::InboundFrame;
use crate::history::{filename, HistoryStore, MessageFormat, Role};
use crate::interpreter::{Interpreter, InterpreterError};
use crate::state::SettingsStore;
use futures_util::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Maximum chat message length in characters
pub const MAX_MESSAGE_LENGTH: usize = 100_000;

/// Sending half of a session's outbound queue
pub type Outbox = mpsc::UnboundedSender<Outbound>;

/// The client side of the channel is gone
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("client channel closed")]
pub struct ChannelClosed;

fn emit(out: &Outbox, envelope: Outbound) -> Result<(), ChannelClosed> {
    out.send(envelope).map_err(|_| ChannelClosed)
}

/// Validate chat text
pub fn validate_message(message: &str) -> Result<(), String> {
    if message.trim().is_empty() {
        return Err("Message cannot be empty".to_string());
    }
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message exceeds maximum length of {} characters",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

enum Turn {
    Chat(String),
    Execute { language: String, code: String },
}

/// State of one live connection
pub struct Session {
    id: String,
    settings: Arc<SettingsStore>,
    history: Arc<HistoryStore>,
    interpreter: Box<dyn Interpreter>,
    transcript: Transcript,
    turns: u64,
}

impl Session {
    /// Start a session bound to the shared stores
    pub fn new(
        id: impl Into<String>,
        settings: Arc<SettingsStore>,
        history: Arc<HistoryStore>,
        interpreter: Box<dyn Interpreter>,
    ) -> Self {
        Self {
            id: id.into(),
            settings,
            history,
            interpreter,
            transcript: Transcript::new(),
            turns: 0,
        }
    }

    /// Session identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current transcript
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Handle one frame of the live channel
    ///
    /// Binary frames are answered with an `error` envelope.
    pub async fn handle_frame(
        &mut self,
        frame: InboundFrame,
        out: &Outbox,
    ) -> Result<(), ChannelClosed> {
        match frame {
            InboundFrame::Text(text) => self.handle_text(&text, out).await,
            InboundFrame::Binary => {
                warn!(session_id = %self.id, "Rejected binary frame");
                emit(out, Outbound::error("Binary frames are not supported"))
            }
        }
    }

    /// Parse one text frame and handle it
    ///
    /// Malformed input yields a single `error` envelope; the session stays
    /// usable. `Err` means the client is gone and the session should end.
    pub async fn handle_text(&mut self, text: &str, out: &Outbox) -> Result<(), ChannelClosed> {
        match serde_json::from_str::<Inbound>(text) {
            Ok(inbound) => self.handle(inbound, out).await,
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Rejected malformed envelope");
                emit(out, Outbound::error(format!("Invalid message: {}", e)))
            }
        }
    }

    /// Handle one parsed envelope
    pub async fn handle(&mut self, inbound: Inbound, out: &Outbox) -> Result<(), ChannelClosed> {
        debug!(session_id = %self.id, kind = inbound.kind(), "Handling envelope");

        match inbound {
            Inbound::Chat { message, settings } => {
                if let Err(reason) = validate_message(&message) {
                    return emit(out, Outbound::error(reason));
                }
                if let Some(settings) = settings.filter(has_entries) {
                    if let Err(e) = self.settings.set_value(settings).await {
                        return emit(out, Outbound::error(e.to_string()));
                    }
                }
                emit(
                    out,
                    Outbound::Message {
                        role: Role::User,
                        content: message.clone(),
                        format: MessageFormat::Text,
                    },
                )?;
                self.transcript.push_user(&message);
                self.run_turn(Turn::Chat(message), out).await
            }
            Inbound::Execute { language, code } => {
                if code.trim().is_empty() {
                    return emit(out, Outbound::error("Code cannot be empty"));
                }
                emit(
                    out,
                    Outbound::status(format!("Executing {} code...", language)),
                )?;
                self.transcript.push_user_code(&language, &code);
                self.run_turn(Turn::Execute { language, code }, out).await
            }
            Inbound::UpdateSettings { settings } => match self.settings.set_value(settings).await {
                Ok(()) => Ok(()),
                Err(e) => emit(out, Outbound::error(e.to_string())),
            },
            Inbound::NewChat => {
                self.save_transcript(out).await?;
                self.reset(out).await?;
                emit(out, Outbound::status("New chat started"))
            }
            Inbound::ClearChat => {
                self.reset(out).await?;
                emit(out, Outbound::status("Chat cleared"))
            }
        }
    }

    async fn run_turn(&mut self, turn: Turn, out: &Outbox) -> Result<(), ChannelClosed> {
        self.turns += 1;
        let turn_number = self.turns;
        // Read after any settings carried by the envelope were applied
        let settings = self.settings.get().await;

        let mut stream = match &turn {
            Turn::Chat(message) => self.interpreter.chat(message, &settings),
            Turn::Execute { language, code } => self.interpreter.execute(language, code, &settings),
        };

        let mut chunks = 0usize;
        let mut failure: Option<InterpreterError> = None;
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => {
                    chunks += 1;
                    self.transcript.push_chunk(&chunk);
                    emit(out, Outbound::from(chunk))?;
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        drop(stream);

        match failure {
            None => {
                info!(session_id = %self.id, turn = turn_number, chunks, "Turn completed");
                emit(out, Outbound::status(STATUS_DONE))
            }
            Some(e) => {
                warn!(session_id = %self.id, turn = turn_number, chunks, error = %e, "Turn failed");
                let prefix = match turn {
                    Turn::Chat(_) => "Error processing message",
                    Turn::Execute { .. } => "Error executing code",
                };
                emit(out, Outbound::error(format!("{}: {}", prefix, e)))
            }
        }
    }

    /// Write the transcript to history before it is dropped
    ///
    /// Completes before the next envelope is read, so a `chat` sent right
    /// after `new_chat` never races the save.
    async fn save_transcript(&mut self, out: &Outbox) -> Result<(), ChannelClosed> {
        if self.transcript.is_empty() {
            return Ok(());
        }
        let settings = self.settings.get().await;
        if !settings.conversation_history {
            debug!(session_id = %self.id, "Conversation history disabled, not saving");
            return Ok(());
        }

        let fixed_name = settings.conversation_filename.trim();
        let result = if fixed_name.is_empty() {
            self.history.save(self.transcript.messages()).await
        } else {
            let name = if fixed_name.ends_with(filename::EXTENSION) {
                fixed_name.to_string()
            } else {
                format!("{}{}", fixed_name, filename::EXTENSION)
            };
            self.history
                .save_as(&name, self.transcript.messages())
                .await
                .map(|()| name)
        };

        match result {
            Ok(filename) => {
                info!(session_id = %self.id, filename = %filename, "Transcript saved");
                Ok(())
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "Failed to save transcript");
                emit(out, Outbound::error(format!("Failed to save conversation: {}", e)))
            }
        }
    }

    async fn reset(&mut self, out: &Outbox) -> Result<(), ChannelClosed> {
        self.transcript.clear();
        if let Err(e) = self.interpreter.reset().await {
            warn!(session_id = %self.id, error = %e, "Interpreter reset failed");
            emit(out, Outbound::error(format!("Failed to reset interpreter: {}", e)))?;
        }
        Ok(())
    }
}

fn has_entries(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}
