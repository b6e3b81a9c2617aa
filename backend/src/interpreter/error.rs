//! Interpreter-specific error types
//!
//! Errors that can occur while driving the wrapped interpreter (process
//! spawning, protocol violations, timeouts, upstream failures).

use thiserror::Error;

/// Errors that can occur during a chat or execute turn
#[derive(Error, Debug)]
pub enum InterpreterError {
    /// Failed to spawn the bridge process (e.g., command not found)
    #[error("Failed to start interpreter bridge `{command}`: {source}")]
    SpawnFailed {
        /// Command that was run
        command: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Reading from or writing to the bridge failed
    #[error("Interpreter bridge I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The bridge wrote something that is not a protocol event
    #[error("Interpreter bridge sent an invalid event: {0}")]
    Protocol(String),

    /// The bridge process exited mid-turn
    #[error("Interpreter bridge exited: {0}")]
    Exited(String),

    /// No output within the per-chunk timeout
    #[error("Interpreter produced no output for {0} seconds")]
    Timeout(u64),

    /// The interpreter itself reported a failure
    #[error("{0}")]
    Upstream(String),
}
