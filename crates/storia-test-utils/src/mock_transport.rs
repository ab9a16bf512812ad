// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock turn transport for deterministic testing.
//!
//! Inbound frames are scripted up front; outbound frames are captured and
//! readable through a [`TransportHandle`] after the transport has been moved
//! into the code under test.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use storia_core::StoriaError;
use storia_core::traits::TurnTransport;

#[derive(Default)]
struct Outbound {
    sent: Vec<String>,
    closed: bool,
}

enum Inbound {
    Text(String),
    Error(String),
}

/// A scripted transport.
pub struct MockTransport {
    inbound: VecDeque<Inbound>,
    outbound: Arc<Mutex<Outbound>>,
    hold_open: bool,
    fail_sends: bool,
}

/// Read access to what a [`MockTransport`] sent.
#[derive(Clone)]
pub struct TransportHandle {
    outbound: Arc<Mutex<Outbound>>,
}

fn lock(outbound: &Mutex<Outbound>) -> std::sync::MutexGuard<'_, Outbound> {
    outbound.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    /// A transport that delivers `frames` and then reports a clean close.
    pub fn new<S: Into<String>>(frames: impl IntoIterator<Item = S>) -> Self {
        Self {
            inbound: frames.into_iter().map(|f| Inbound::Text(f.into())).collect(),
            outbound: Arc::default(),
            hold_open: false,
            fail_sends: false,
        }
    }

    /// After the scripted frames, block forever instead of closing.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Append a read error after the frames scripted so far.
    pub fn then_error(mut self, message: impl Into<String>) -> Self {
        self.inbound.push_back(Inbound::Error(message.into()));
        self
    }

    /// Make every `send_text` fail.
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// A handle for inspecting outbound frames.
    pub fn handle(&self) -> TransportHandle {
        TransportHandle {
            outbound: Arc::clone(&self.outbound),
        }
    }
}

impl TransportHandle {
    /// Every frame sent so far.
    pub fn sent(&self) -> Vec<String> {
        lock(&self.outbound).sent.clone()
    }

    /// Whether `close` was called.
    pub fn closed(&self) -> bool {
        lock(&self.outbound).closed
    }
}

#[async_trait]
impl TurnTransport for MockTransport {
    async fn recv_text(&mut self) -> Option<Result<String, StoriaError>> {
        match self.inbound.pop_front() {
            Some(Inbound::Text(text)) => Some(Ok(text)),
            Some(Inbound::Error(message)) => Some(Err(StoriaError::transport(message))),
            None if self.hold_open => std::future::pending().await,
            None => None,
        }
    }

    async fn send_text(&mut self, text: String) -> Result<(), StoriaError> {
        if self.fail_sends {
            return Err(StoriaError::transport("send failed"));
        }
        lock(&self.outbound).sent.push(text);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StoriaError> {
        lock(&self.outbound).closed = true;
        Ok(())
    }
}
