// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted generative backend for deterministic testing.
//!
//! Replies are consumed in order across every chat session and one-shot
//! call. Once the script runs out the backend echoes the user text.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use storia_core::traits::{ChatSession, GenerativeBackend, PluginAdapter};
use storia_core::types::{
    AdapterType, Candidate, ContextTurn, GenerateResponse, HealthStatus, ResponsePart, TurnPart,
};
use storia_core::{Role, StoriaError};

/// One scripted backend outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// A single candidate with one text part.
    Text(String),
    /// A response with zero candidates.
    Empty,
    /// A single candidate whose first part is inline media.
    Media { mime_type: String, data: Vec<u8> },
    /// A backend failure with this message.
    Error(String),
}

impl ScriptedReply {
    fn into_result(self) -> Result<GenerateResponse, StoriaError> {
        match self {
            ScriptedReply::Text(text) => Ok(GenerateResponse::from_text(text)),
            ScriptedReply::Empty => Ok(GenerateResponse::default()),
            ScriptedReply::Media { mime_type, data } => Ok(GenerateResponse {
                candidates: vec![Candidate {
                    parts: vec![ResponsePart::Media { mime_type, data }],
                }],
            }),
            ScriptedReply::Error(message) => Err(StoriaError::backend(message)),
        }
    }
}

#[derive(Default)]
struct Shared {
    script: VecDeque<ScriptedReply>,
    seeded: Vec<Vec<ContextTurn>>,
    one_shot: Vec<Vec<ContextTurn>>,
    sent: Vec<String>,
}

/// A generative backend returning pre-configured replies.
#[derive(Clone, Default)]
pub struct MockBackend {
    shared: Arc<Mutex<Shared>>,
    delay: Option<Duration>,
}

impl MockBackend {
    /// Create a backend with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that replays `replies` in order.
    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let backend = Self::new();
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    /// Sleep this long before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Append a reply to the script.
    pub fn push_reply(&self, reply: ScriptedReply) {
        self.lock().script.push_back(reply);
    }

    /// Histories every chat session was opened with, in order.
    pub fn seeded_histories(&self) -> Vec<Vec<ContextTurn>> {
        self.lock().seeded.clone()
    }

    /// Turns passed to each one-shot `generate` call.
    pub fn generate_calls(&self) -> Vec<Vec<ContextTurn>> {
        self.lock().one_shot.clone()
    }

    /// User texts sent through chat sessions.
    pub fn sent_turns(&self) -> Vec<String> {
        self.lock().sent.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn next_reply(&self, echo: &str) -> Result<GenerateResponse, StoriaError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = self
            .lock()
            .script
            .pop_front()
            .unwrap_or_else(|| ScriptedReply::Text(format!("echo: {echo}")));
        reply.into_result()
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generative
    }

    async fn health_check(&self) -> Result<HealthStatus, StoriaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StoriaError> {
        Ok(())
    }
}

#[async_trait]
impl GenerativeBackend for MockBackend {
    fn start_chat(&self, history: Vec<ContextTurn>) -> Box<dyn ChatSession> {
        self.lock().seeded.push(history.clone());
        Box::new(MockChat {
            backend: self.clone(),
            history,
        })
    }

    async fn generate(&self, turns: Vec<ContextTurn>) -> Result<GenerateResponse, StoriaError> {
        let echo = turns
            .iter()
            .flat_map(|t| &t.parts)
            .find_map(|p| match p {
                TurnPart::Text(text) => Some(text.clone()),
                TurnPart::Media { .. } => None,
            })
            .unwrap_or_default();
        self.lock().one_shot.push(turns);
        self.next_reply(&echo).await
    }
}

/// Chat session handed out by [`MockBackend::start_chat`].
pub struct MockChat {
    backend: MockBackend,
    history: Vec<ContextTurn>,
}

#[async_trait]
impl ChatSession for MockChat {
    async fn send_turn(&mut self, text: &str) -> Result<GenerateResponse, StoriaError> {
        self.backend.lock().sent.push(text.to_string());
        let response = self.backend.next_reply(text).await?;
        self.history.push(ContextTurn::text(Role::User, text));
        if let Some(candidate) = response.candidates.first() {
            let parts = candidate
                .parts
                .iter()
                .filter_map(|part| match part {
                    ResponsePart::Text(text) => Some(TurnPart::Text(text.clone())),
                    ResponsePart::Media { mime_type, data } => Some(TurnPart::Media {
                        mime_type: mime_type.clone(),
                        data: data.clone(),
                    }),
                    ResponsePart::Other(_) => None,
                })
                .collect();
            self.history.push(ContextTurn {
                role: Role::Model,
                parts,
            });
        }
        Ok(response)
    }

    fn history(&self) -> &[ContextTurn] {
        &self.history
    }
}
