//! WebSocket layer: the transcript channel.
//!
//! The speech-to-text collaborator (in the UI) streams the cumulative
//! transcript as `TranscriptUpdate` frames; the engine's events flow
//! back on the same socket as JSON. One socket per session.
//!
//! The socket never drives the engine synchronously: incoming frames
//! are fire-and-forget commands, and a slow reader only loses events
//! (broadcast lag), never stalls detection.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::detector::EngineEvent;

/// Frames accepted from the transcript source.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum WsIncoming {
    /// The current full transcript text (cumulative, but treated as
    /// replacement text; the scanner does not assume append-only).
    TranscriptUpdate { text: String },
    /// Reset the session: queue, triggered phrases, attention.
    Clear {},
}

/// WebSocket upgrade handler. Rejects unknown sessions before upgrading.
pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(ctx): State<ApiContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    {
        let sessions = ctx.sessions.read().await;
        if sessions.get(&id).is_none() {
            return Err(ApiError::SessionNotFound(id));
        }
    }
    tracing::info!(session = %id, "WebSocket upgrade accepted");
    Ok(ws.on_upgrade(move |socket| handle_ws(socket, ctx, id)))
}

/// Main connection handler: spawns a sender task forwarding engine
/// events to the socket, then consumes transcript frames until the
/// socket closes or the session ends.
async fn handle_ws(socket: WebSocket, ctx: ApiContext, id: Uuid) {
    let mut events = {
        let sessions = ctx.sessions.read().await;
        match sessions.get(&id) {
            Some(handle) => handle.subscribe(),
            None => return,
        }
    };

    let (ws_sink, mut ws_stream) = socket.split();

    let sender = tokio::spawn(async move {
        let mut sink = ws_sink;
        loop {
            match events.recv().await {
                Ok(event) => {
                    let ended = matches!(event, EngineEvent::SessionEnded);
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(_) => continue,
                    };
                    if sink.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                    if ended {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "WS subscriber lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        let _ = sink.close().await;
    });

    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                let incoming = match serde_json::from_str::<WsIncoming>(&text) {
                    Ok(incoming) => incoming,
                    Err(_) => {
                        tracing::debug!(session = %id, "Ignoring malformed WS frame");
                        continue;
                    }
                };

                let sessions = ctx.sessions.read().await;
                let Some(handle) = sessions.get(&id) else {
                    break;
                };
                let result = match incoming {
                    WsIncoming::TranscriptUpdate { text } => {
                        handle.update_transcript(text).await
                    }
                    WsIncoming::Clear {} => handle.clear().await,
                };
                if result.is_err() {
                    // Engine gone (session ended mid-connection).
                    break;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {} // Ping/Pong handled by the stack
        }
    }

    sender.abort();
    tracing::info!(session = %id, "WebSocket disconnected");
}

// ═══════════════════════════════════════════════════════════
// Integration tests — live socket against a bound server
// ═══════════════════════════════════════════════════════════
