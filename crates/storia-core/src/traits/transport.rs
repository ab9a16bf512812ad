// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bidirectional text-frame transport used by the turn relay.

use async_trait::async_trait;

use crate::error::StoriaError;

/// A message-oriented connection carrying UTF-8 text frames.
#[async_trait]
pub trait TurnTransport: Send {
    /// Next inbound text frame. `None` once the peer has closed.
    async fn recv_text(&mut self) -> Option<Result<String, StoriaError>>;

    /// Sends one text frame.
    async fn send_text(&mut self, text: String) -> Result<(), StoriaError>;

    /// Closes the connection. Closing twice is not an error.
    async fn close(&mut self) -> Result<(), StoriaError>;
}
