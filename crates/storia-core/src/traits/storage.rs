// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence traits for sessions (messages + uploads) and users.

use async_trait::async_trait;

use crate::error::StoriaError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Message, NewMessage, NewUpload, NewUser, Upload, User};

/// Storage for conversation turns and session uploads.
///
/// Implementations must return messages of a session ordered by creation
/// time with insertion order breaking ties.
#[async_trait]
pub trait SessionStore: PluginAdapter {
    /// Returns the upload attached to `(user_id, session_id)`, if any.
    async fn find_upload(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Upload>, StoriaError>;

    /// Stores the session's upload. A second upload for the same session is
    /// rejected with [`StoriaError::InvalidInput`].
    async fn save_upload(&self, upload: &NewUpload) -> Result<i64, StoriaError>;

    /// Appends a turn and returns it with its assigned id and timestamp.
    async fn save_message(&self, message: &NewMessage) -> Result<Message, StoriaError>;

    /// All turns of a session in chronological order.
    async fn list_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<Message>, StoriaError>;

    /// Distinct session ids of a user, ordered by first activity.
    async fn list_session_ids(&self, user_id: &str) -> Result<Vec<String>, StoriaError>;
}

/// Storage for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoriaError>;

    /// Inserts an account. A duplicate email is rejected with
    /// [`StoriaError::InvalidInput`].
    async fn insert_user(&self, user: &NewUser) -> Result<User, StoriaError>;
}
