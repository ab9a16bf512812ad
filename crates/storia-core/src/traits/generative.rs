// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generative backend traits.

use async_trait::async_trait;

use crate::error::StoriaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ContextTurn, GenerateResponse};

/// A process-wide generative backend handle.
///
/// Created once at startup and shared by every connection. Implementations
/// hold no per-conversation state; that lives in the [`ChatSession`]s they
/// hand out.
#[async_trait]
pub trait GenerativeBackend: PluginAdapter {
    /// Opens a conversation seeded with `history`.
    fn start_chat(&self, history: Vec<ContextTurn>) -> Box<dyn ChatSession>;

    /// One-shot generation over `turns`, outside any conversation.
    async fn generate(&self, turns: Vec<ContextTurn>) -> Result<GenerateResponse, StoriaError>;
}

/// A single conversation context, exclusively owned by one connection.
#[async_trait]
pub trait ChatSession: Send {
    /// Sends the next user turn with the full history as context.
    ///
    /// On success the user turn and the first candidate's content are
    /// appended to the history. On failure the history is left unchanged.
    async fn send_turn(&mut self, text: &str) -> Result<GenerateResponse, StoriaError>;

    /// Turns accumulated so far, seeded history first.
    fn history(&self) -> &[ContextTurn];
}
