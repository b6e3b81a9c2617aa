//! Interpreter Web GUI Library
//!
//! This library exposes modules for testing and external use.
//! The main binary is in `src/main.rs`.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
/// Saved conversations on disk
pub mod history;
pub mod interpreter;
pub mod relay;
pub mod router;
/// Application state management
///
/// Handles the settings snapshot, its persistence and the shared context.
pub mod state;
pub mod websocket;
