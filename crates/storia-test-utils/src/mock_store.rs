// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory store for deterministic testing.
//!
//! `MemoryStore` implements `SessionStore` and `UserStore` with the same
//! ordering and uniqueness rules as the PostgreSQL store, plus switches that
//! make individual write paths fail.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::Mutex;

use storia_core::traits::{PluginAdapter, SessionStore, UserStore};
use storia_core::types::{
    AdapterType, HealthStatus, Message, NewMessage, NewUpload, NewUser, Upload, User,
};
use storia_core::{Role, StoriaError};

#[derive(Default)]
struct State {
    messages: Vec<Message>,
    uploads: Vec<Upload>,
    users: Vec<User>,
    next_message_id: i64,
    next_upload_id: i64,
    ticks: i64,
}

impl State {
    /// Strictly increasing timestamps, like `clock_timestamp()` in Postgres.
    fn tick(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        epoch() + Duration::milliseconds(self.ticks)
    }

    fn push_message(&mut self, message: &NewMessage, created_at: DateTime<Utc>) -> Message {
        self.next_message_id += 1;
        let stored = Message {
            id: self.next_message_id,
            user_id: message.user_id.clone(),
            session_id: message.session_id.clone(),
            sender: message.sender,
            content: message.content.clone(),
            created_at,
        };
        self.messages.push(stored.clone());
        stored
    }
}

/// An in-memory store shared by clones.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    fail_user_writes: Arc<AtomicBool>,
    fail_model_writes: Arc<AtomicBool>,
    fail_reads: Arc<AtomicBool>,
}

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0)
        .single()
        .unwrap_or_default()
}

fn injected(what: &str) -> StoriaError {
    StoriaError::storage(std::io::Error::other(format!("injected {what} failure")))
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `save_message` with sender `user` fail.
    pub fn fail_user_writes(&self, fail: bool) {
        self.fail_user_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every `save_message` with sender `model` fail.
    pub fn fail_model_writes(&self, fail: bool) {
        self.fail_model_writes.store(fail, Ordering::SeqCst);
    }

    /// Make every read (`find_upload`, `list_messages`, `list_session_ids`) fail.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Insert a message with an explicit timestamp, bypassing failure switches.
    ///
    /// Lets tests build histories with equal timestamps to check tie ordering.
    pub async fn insert_message_at(
        &self,
        message: &NewMessage,
        created_at: DateTime<Utc>,
    ) -> Message {
        self.state.lock().await.push_message(message, created_at)
    }

    /// Every stored message in insertion order.
    pub async fn all_messages(&self) -> Vec<Message> {
        self.state.lock().await.messages.clone()
    }

    /// Number of stored messages across all sessions.
    pub async fn message_count(&self) -> usize {
        self.state.lock().await.messages.len()
    }

    fn check_reads(&self) -> Result<(), StoriaError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(injected("read"));
        }
        Ok(())
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, StoriaError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("reads failing".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StoriaError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn find_upload(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Upload>, StoriaError> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .uploads
            .iter()
            .find(|u| u.user_id == user_id && u.session_id == session_id)
            .cloned())
    }

    async fn save_upload(&self, upload: &NewUpload) -> Result<i64, StoriaError> {
        let mut state = self.state.lock().await;
        if state
            .uploads
            .iter()
            .any(|u| u.user_id == upload.user_id && u.session_id == upload.session_id)
        {
            return Err(StoriaError::InvalidInput(format!(
                "session {} already has an upload",
                upload.session_id
            )));
        }
        state.next_upload_id += 1;
        let id = state.next_upload_id;
        let created_at = state.tick();
        state.uploads.push(Upload {
            id,
            user_id: upload.user_id.clone(),
            session_id: upload.session_id.clone(),
            filename: upload.filename.clone(),
            content_type: upload.content_type.clone(),
            bytes: upload.bytes.clone(),
            created_at,
        });
        Ok(id)
    }

    async fn save_message(&self, message: &NewMessage) -> Result<Message, StoriaError> {
        let failing = match message.sender {
            Role::User => self.fail_user_writes.load(Ordering::SeqCst),
            Role::Model => self.fail_model_writes.load(Ordering::SeqCst),
        };
        if failing {
            return Err(injected(&format!("{} write", message.sender)));
        }
        let mut state = self.state.lock().await;
        let created_at = state.tick();
        Ok(state.push_message(message, created_at))
    }

    async fn list_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<Message>, StoriaError> {
        self.check_reads()?;
        let state = self.state.lock().await;
        let mut messages: Vec<Message> = state
            .messages
            .iter()
            .filter(|m| m.user_id == user_id && m.session_id == session_id)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(messages)
    }

    async fn list_session_ids(&self, user_id: &str) -> Result<Vec<String>, StoriaError> {
        self.check_reads()?;
        let state = self.state.lock().await;
        let mut firsts: Vec<(DateTime<Utc>, i64, String)> = Vec::new();
        let activity = state
            .messages
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| (m.created_at, m.id, &m.session_id))
            .chain(
                state
                    .uploads
                    .iter()
                    .filter(|u| u.user_id == user_id)
                    .map(|u| (u.created_at, 0, &u.session_id)),
            );
        for (at, id, session_id) in activity {
            match firsts.iter_mut().find(|(_, _, s)| s == session_id) {
                Some(entry) if (at, id) < (entry.0, entry.1) => {
                    entry.0 = at;
                    entry.1 = id;
                }
                Some(_) => {}
                None => firsts.push((at, id, session_id.clone())),
            }
        }
        firsts.sort();
        Ok(firsts.into_iter().map(|(_, _, s)| s).collect())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoriaError> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoriaError> {
        let mut state = self.state.lock().await;
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(StoriaError::InvalidInput(format!(
                "email {} is already registered",
                user.email
            )));
        }
        let stored = User {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
        };
        state.users.push(stored.clone());
        Ok(stored)
    }
}
