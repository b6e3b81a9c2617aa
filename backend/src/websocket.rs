//! WebSocket handler for the live chat channel
//!
//! Each connection gets its own relay session and interpreter. Two tasks run
//! per socket: the relay reads frames and runs turns, and the sender writes
//! outbound envelopes plus keepalive pings. When either finishes the other is
//! aborted, which drops the session and with it the interpreter process.

use crate::relay::{self, InboundFrame, Outbound, Session};
use crate::state::AppState;
use async_stream::stream;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::{IntervalStream, UnboundedReceiverStream};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Interval between keepalive pings
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Frames queued for the socket writer
enum Frame {
    Envelope(Outbound),
    Ping,
}

/// WebSocket upgrade handler
pub async fn websocket_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let session_id = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();

    info!(session_id = %session_id, "WebSocket client connected");

    let session = Session::new(
        session_id.clone(),
        state.settings.clone(),
        state.history.clone(),
        state.interpreters.create(&session_id),
    );

    let (out_tx, out_rx) = mpsc::unbounded_channel::<Outbound>();
    let mut frames = Box::pin(outbound_frames(out_rx));

    // Task to write envelopes and keepalive pings to the socket
    let send_session = session_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = frames.next().await {
            let message = match frame {
                Frame::Envelope(envelope) => match serde_json::to_string(&envelope) {
                    Ok(text) => Message::Text(text),
                    Err(e) => {
                        error!(session_id = %send_session, error = %e, "Failed to encode envelope");
                        continue;
                    }
                },
                Frame::Ping => Message::Ping(vec![]),
            };
            if let Err(e) = sender.send(message).await {
                debug!(session_id = %send_session, error = %e, "Failed to send frame");
                break;
            }
        }
    });

    // Relay data frames until the client closes
    let recv_session = session_id.clone();
    let mut relay_task = tokio::spawn(async move {
        let frames = Box::pin(stream! {
            while let Some(msg) = receiver.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        yield InboundFrame::Text(text);
                    }
                    Ok(Message::Close(_)) => {
                        info!(session_id = %recv_session, "WebSocket client disconnected");
                        break;
                    }
                    Ok(Message::Binary(_)) => {
                        yield InboundFrame::Binary;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(session_id = %recv_session, error = %e, "WebSocket error");
                        break;
                    }
                }
            }
        });
        relay::run(session, frames, out_tx).await;
    });

    // Wait for either side to finish
    tokio::select! {
        _ = &mut relay_task => {}
        _ = &mut send_task => {}
    }
    relay_task.abort();
    send_task.abort();

    info!(session_id = %session_id, "WebSocket connection closed");
}

/// Outbound envelopes interleaved with a ping every `PING_INTERVAL`
fn outbound_frames(out_rx: mpsc::UnboundedReceiver<Outbound>) -> impl Stream<Item = Frame> {
    let envelopes =
        tokio_stream::StreamExt::map(UnboundedReceiverStream::new(out_rx), Frame::Envelope);
    let ticker = tokio::time::interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);
    let pings = tokio_stream::StreamExt::map(IntervalStream::new(ticker), |_| Frame::Ping);
    tokio_stream::StreamExt::merge(envelopes, pings)
}
