//! Wrapped interpreter
//!
//! The assistant that actually talks to the LLM and runs code lives outside
//! this server. This module defines the seam the relay drives and the
//! subprocess bridge that implements it.

pub mod bridge;
pub mod error;
pub mod protocol;

pub use bridge::{BridgeFactory, BridgeInterpreter};
pub use error::InterpreterError;

use crate::history::{MessageFormat, Role};
use crate::state::Settings;
use async_trait::async_trait;
use futures_util::Stream;
use std::pin::Pin;

/// One piece of streamed interpreter output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    /// Prose delta
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
    /// Console output delta
    Console {
        /// Output text
        content: String,
    },
}

/// Lazy, finite, non-restartable output of one turn
///
/// The stream ends after the last chunk, or right after yielding an error.
pub type ChunkStream<'a> = Pin<Box<dyn Stream<Item = Result<Chunk, InterpreterError>> + Send + 'a>>;

/// Conversation-holding interpreter driven by one session
///
/// Turns take `&mut self`: an interpreter is never invoked concurrently.
#[async_trait]
pub trait Interpreter: Send {
    /// Run a chat turn with the given settings
    fn chat<'a>(&'a mut self, message: &'a str, settings: &'a Settings) -> ChunkStream<'a>;

    /// Run a code block directly
    fn execute<'a>(
        &'a mut self,
        language: &'a str,
        code: &'a str,
        settings: &'a Settings,
    ) -> ChunkStream<'a>;

    /// Forget the in-memory conversation
    async fn reset(&mut self) -> Result<(), InterpreterError>;
}

/// Creates one interpreter per session
pub trait InterpreterFactory: Send + Sync {
    /// New interpreter for the session `session_id`
    fn create(&self, session_id: &str) -> Box<dyn Interpreter>;
}
