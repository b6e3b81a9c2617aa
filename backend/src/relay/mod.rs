//! Session relay
//!
//! Bridges one browser's live channel to its interpreter: parses inbound
//! envelopes, runs turns in arrival order, keeps the transcript and
//! writes it to history when a new chat starts.

pub mod envelope;
pub mod session;
pub mod transcript;

pub use envelope::{Inbound, Outbound, STATUS_DONE};
pub use session::{ChannelClosed, Outbox, Session, MAX_MESSAGE_LENGTH};
pub use transcript::Transcript;

use futures_util::{Stream, StreamExt};
use tracing::{debug, info};

/// Data frame read from the live channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// JSON envelope text
    Text(String),
    /// Binary payload; not part of the protocol
    Binary,
}

impl From<String> for InboundFrame {
    fn from(text: String) -> Self {
        InboundFrame::Text(text)
    }
}

/// Drive `session` until the inbound stream ends or the client goes away
///
/// Frames are handled strictly one after another; the next frame is not
/// read until every envelope caused by the previous one has been queued.
/// Returns the session so callers can inspect its final transcript.
pub async fn run<S>(mut session: Session, mut inbound: S, out: Outbox) -> Session
where
    S: Stream + Unpin,
    S::Item: Into<InboundFrame>,
{
    info!(session_id = %session.id(), "Relay session started");

    while let Some(frame) = inbound.next().await {
        if session.handle_frame(frame.into(), &out).await.is_err() {
            debug!(session_id = %session.id(), "Outbound channel closed");
            break;
        }
    }

    info!(
        session_id = %session.id(),
        messages = session.transcript().len(),
        "Relay session ended"
    );
    session
}
