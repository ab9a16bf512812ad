// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-connection turn relay.
//!
//! One relay drives one connection. Turns are handled strictly in order:
//! dispatch to the generative backend, persist the user turn, persist the
//! reply, then send the reply.

use std::sync::Arc;

use strum::Display;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use storia_core::types::{ContextTurn, NewMessage};
use storia_core::{
    ChatSession, GenerativeBackend, PersistenceMode, Role, SessionStore, StoriaError,
    TurnTransport,
};

use crate::frame::{ErrorFrame, HistoryFrame};
use crate::history::HistoryLoader;

/// States of the relay state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RelayState {
    Connecting,
    /// Loading history and opening the chat session.
    Seeding,
    Ready,
    /// Waiting for the next inbound frame.
    Receiving,
    /// Waiting on the generative backend.
    Dispatching,
    Persisting,
    Sending,
    Closed,
}

/// Why a relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum RelayExit {
    /// The peer closed the connection.
    ClientClosed,
    /// Reading or writing the connection failed.
    TransportFailed,
    /// The backend failed or returned no usable text.
    BackendFailed,
    /// A turn could not be persisted in strict mode.
    PersistenceFailed,
    /// The connection token was cancelled.
    Cancelled,
}

/// Per-connection relay settings.
#[derive(Debug, Clone, Copy)]
pub struct RelayOptions {
    pub persistence: PersistenceMode,
    /// Send the loaded history as the first frame.
    pub send_history: bool,
}

impl Default for RelayOptions {
    fn default() -> Self {
        Self {
            persistence: PersistenceMode::BestEffort,
            send_history: true,
        }
    }
}

enum TurnOutcome {
    Continue,
    Exit(RelayExit),
}

/// Drives one connection from seeding to close.
pub struct TurnRelay {
    user_id: String,
    session_id: String,
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn GenerativeBackend>,
    options: RelayOptions,
    cancel: CancellationToken,
    state: RelayState,
}

impl TurnRelay {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn GenerativeBackend>,
        options: RelayOptions,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            store,
            backend,
            options,
            cancel: CancellationToken::new(),
            state: RelayState::Connecting,
        }
    }

    /// Stop at the next await point once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    fn transition(&mut self, next: RelayState) {
        debug!(
            session_id = %self.session_id,
            from = %self.state,
            to = %next,
            "relay state transition"
        );
        self.state = next;
    }

    /// Load the session's history and open a chat session seeded with it.
    ///
    /// Returns the history alongside the chat so it can be shown to the client.
    pub async fn seed(
        &mut self,
    ) -> Result<(Box<dyn ChatSession>, Vec<ContextTurn>), StoriaError> {
        self.transition(RelayState::Seeding);
        let history = HistoryLoader::new(Arc::clone(&self.store))
            .load_history(&self.user_id, &self.session_id)
            .await?;
        let chat = self.backend.start_chat(history.clone());
        Ok((chat, history))
    }

    /// Run the relay until the connection ends.
    ///
    /// A seeding failure is reported to the peer as an error frame and
    /// returned as `Err`; every other ending is reported as a [`RelayExit`].
    /// The transport is closed in both cases.
    pub async fn run(
        &mut self,
        transport: &mut dyn TurnTransport,
    ) -> Result<RelayExit, StoriaError> {
        let (mut chat, history) = match self.seed().await {
            Ok(seeded) => seeded,
            Err(e) => {
                error!(
                    user_id = %self.user_id,
                    session_id = %self.session_id,
                    error = %e,
                    "failed to seed chat session"
                );
                self.send_error(transport, &e).await;
                self.close(transport).await;
                return Err(e);
            }
        };

        let exit = match self.send_history(transport, &history).await {
            Some(exit) => exit,
            None => {
                self.transition(RelayState::Ready);
                self.turn_loop(chat.as_mut(), transport).await
            }
        };

        self.close(transport).await;
        info!(
            user_id = %self.user_id,
            session_id = %self.session_id,
            exit = %exit,
            "relay finished"
        );
        Ok(exit)
    }

    async fn send_error(&self, transport: &mut dyn TurnTransport, err: &StoriaError) {
        let message = err.to_string();
        let frame = match serde_json::to_string(&ErrorFrame { error: &message }) {
            Ok(frame) => frame,
            Err(_) => return,
        };
        if let Err(e) = transport.send_text(frame).await {
            debug!(error = %e, "failed to send error frame");
        }
    }

    async fn send_history(
        &mut self,
        transport: &mut dyn TurnTransport,
        history: &[ContextTurn],
    ) -> Option<RelayExit> {
        if !self.options.send_history {
            return None;
        }
        let frame = match HistoryFrame::new(history).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(error = %e, "failed to encode history frame, skipping it");
                return None;
            }
        };
        match transport.send_text(frame).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "failed to send history frame");
                Some(RelayExit::TransportFailed)
            }
        }
    }

    async fn turn_loop(
        &mut self,
        chat: &mut dyn ChatSession,
        transport: &mut dyn TurnTransport,
    ) -> RelayExit {
        let cancel = self.cancel.clone();
        loop {
            self.transition(RelayState::Receiving);
            // Inbound first: a peer close that also fires the token is
            // still a client close.
            let inbound = tokio::select! {
                biased;
                inbound = transport.recv_text() => inbound,
                _ = cancel.cancelled() => return RelayExit::Cancelled,
            };
            let text = match inbound {
                None => return RelayExit::ClientClosed,
                Some(Err(e)) => {
                    warn!(session_id = %self.session_id, error = %e, "connection read failed");
                    return RelayExit::TransportFailed;
                }
                Some(Ok(text)) => text,
            };

            match self.handle_turn(chat, transport, &cancel, text).await {
                TurnOutcome::Continue => {}
                TurnOutcome::Exit(exit) => return exit,
            }
        }
    }

    async fn handle_turn(
        &mut self,
        chat: &mut dyn ChatSession,
        transport: &mut dyn TurnTransport,
        cancel: &CancellationToken,
        text: String,
    ) -> TurnOutcome {
        self.transition(RelayState::Dispatching);
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return TurnOutcome::Exit(RelayExit::Cancelled),
            response = chat.send_turn(&text) => response,
        };
        let reply = match response.and_then(|r| r.first_text().map(str::to_owned)) {
            Ok(reply) => reply,
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "backend dispatch failed");
                return TurnOutcome::Exit(RelayExit::BackendFailed);
            }
        };

        self.transition(RelayState::Persisting);
        if !self.persist(Role::User, text).await {
            return TurnOutcome::Exit(RelayExit::PersistenceFailed);
        }
        if !self.persist(Role::Model, reply.clone()).await {
            return TurnOutcome::Exit(RelayExit::PersistenceFailed);
        }

        self.transition(RelayState::Sending);
        if let Err(e) = transport.send_text(reply).await {
            warn!(session_id = %self.session_id, error = %e, "failed to send reply");
            return TurnOutcome::Exit(RelayExit::TransportFailed);
        }
        TurnOutcome::Continue
    }

    /// Store one turn. Returns `false` only when the failure must end the
    /// connection.
    async fn persist(&self, sender: Role, content: String) -> bool {
        let message = NewMessage::new(&self.user_id, &self.session_id, sender, content);
        match self.store.save_message(&message).await {
            Ok(_) => true,
            Err(e) => match self.options.persistence {
                PersistenceMode::BestEffort => {
                    warn!(
                        session_id = %self.session_id,
                        sender = %sender,
                        error = %e,
                        "failed to persist turn, continuing"
                    );
                    true
                }
                PersistenceMode::Strict => {
                    error!(
                        session_id = %self.session_id,
                        sender = %sender,
                        error = %e,
                        "failed to persist turn, closing connection"
                    );
                    false
                }
            },
        }
    }

    async fn close(&mut self, transport: &mut dyn TurnTransport) {
        if let Err(e) = transport.close().await {
            debug!(error = %e, "transport close failed");
        }
        self.transition(RelayState::Closed);
    }
}
