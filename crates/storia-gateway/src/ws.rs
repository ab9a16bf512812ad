// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WebSocket story chat.
//!
//! Server -> Client, first frame (unless disabled):
//! ```json
//! {"type": "history", "turns": [{"role": "user", "parts": [{"mime_type": "image/png", "size": 1024}]}]}
//! ```
//! or, when the session cannot be loaded:
//! ```json
//! {"error": "storage error: ..."}
//! ```
//! After that every client text frame is one turn and is answered by exactly
//! one plain text frame holding the reply.

use async_trait::async_trait;
use axum::{
    Extension,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt, stream::SplitSink};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use storia_chat::TurnRelay;
use storia_core::types::Identity;
use storia_core::{StoriaError, TurnTransport};

use crate::auth::resolve_user_id;
use crate::error::ApiError;
use crate::handlers::SessionQuery;
use crate::server::GatewayState;

/// [`TurnTransport`] over an axum WebSocket.
///
/// A background task reads the socket into a one-slot channel so a peer
/// close is seen while a turn is still being dispatched. Close and read
/// errors cancel the connection token.
pub struct WsTransport {
    sink: SplitSink<WebSocket, Message>,
    inbound: mpsc::Receiver<Result<String, StoriaError>>,
    reader: JoinHandle<()>,
    closed: bool,
}

impl WsTransport {
    pub fn new(socket: WebSocket, cancel: CancellationToken) -> Self {
        let (sink, mut stream) = socket.split();
        let (tx, inbound) = mpsc::channel(1);

        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                let item = match frame {
                    Ok(Message::Text(text)) => Ok(text.as_str().to_owned()),
                    Ok(Message::Close(_)) => break,
                    Ok(Message::Binary(data)) => {
                        debug!(bytes = data.len(), "ignoring binary frame");
                        continue;
                    }
                    // Ping and pong are answered by the protocol layer.
                    Ok(_) => continue,
                    Err(e) => Err(StoriaError::Transport {
                        message: format!("websocket read failed: {e}"),
                        source: Some(Box::new(e)),
                    }),
                };
                let failed = item.is_err();
                if tx.send(item).await.is_err() || failed {
                    break;
                }
            }
            // Close the channel before firing the token so the relay sees
            // end-of-stream rather than cancellation.
            drop(tx);
            cancel.cancel();
        });

        Self {
            sink,
            inbound,
            reader,
            closed: false,
        }
    }
}

#[async_trait]
impl TurnTransport for WsTransport {
    async fn recv_text(&mut self) -> Option<Result<String, StoriaError>> {
        self.inbound.recv().await
    }

    async fn send_text(&mut self, text: String) -> Result<(), StoriaError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| StoriaError::Transport {
                message: format!("websocket write failed: {e}"),
                source: Some(Box::new(e)),
            })
    }

    async fn close(&mut self) -> Result<(), StoriaError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.reader.abort();
        self.sink.close().await.map_err(|e| StoriaError::Transport {
            message: format!("websocket close failed: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// GET /api/story/ws?user_id&session_id
///
/// Upgrades to a WebSocket and runs one turn relay on it.
pub async fn story_ws(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
    ext: Option<Extension<Identity>>,
    Query(query): Query<SessionQuery>,
) -> Result<Response, ApiError> {
    let identity = ext.as_ref().map(|Extension(identity)| identity);
    let user_id = resolve_user_id(query.user_id.as_deref(), identity)?;
    let session_id = query
        .session_id()
        .ok_or_else(ApiError::missing_values)?
        .to_string();

    Ok(ws.on_upgrade(move |socket| run_relay(socket, state, user_id, session_id)))
}

async fn run_relay(socket: WebSocket, state: GatewayState, user_id: String, session_id: String) {
    let cancel = state.shutdown.child_token();
    let mut transport = WsTransport::new(socket, cancel.clone());
    let mut relay = TurnRelay::new(
        user_id.clone(),
        session_id.clone(),
        state.sessions.clone(),
        state.backend.clone(),
        state.relay_options(),
    )
    .with_cancellation(cancel);

    info!(user_id = %user_id, session_id = %session_id, "story chat connected");
    match relay.run(&mut transport).await {
        Ok(exit) => debug!(session_id = %session_id, exit = %exit, "story chat ended"),
        Err(e) => warn!(session_id = %session_id, error = %e, "story chat could not start"),
    }
}
