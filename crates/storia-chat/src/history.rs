// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rebuilds a session's conversation context from persisted rows.

use std::sync::Arc;

use tracing::debug;

use storia_core::types::ContextTurn;
use storia_core::{Role, SessionStore, StoriaError};

/// Loads `(user_id, session_id)` into an ordered list of context turns.
#[derive(Clone)]
pub struct HistoryLoader {
    store: Arc<dyn SessionStore>,
}

impl HistoryLoader {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The session's upload as a leading user media turn (when there is
    /// one), followed by every stored message in order.
    ///
    /// Identifiers are not validated; unknown ids simply match nothing.
    /// Any store failure aborts the load.
    pub async fn load_history(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<ContextTurn>, StoriaError> {
        let mut turns = Vec::new();

        match self.store.find_upload(user_id, session_id).await? {
            Some(upload) => {
                turns.push(ContextTurn::media(
                    Role::User,
                    upload.content_type,
                    upload.bytes,
                ));
            }
            None => debug!(user_id, session_id, "session has no upload"),
        }

        let messages = self.store.list_messages(user_id, session_id).await?;
        turns.extend(
            messages
                .into_iter()
                .map(|m| ContextTurn::text(m.sender, m.content)),
        );

        debug!(user_id, session_id, turns = turns.len(), "history loaded");
        Ok(turns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storia_core::types::{NewMessage, NewUpload};
    use storia_test_utils::MemoryStore;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn missing_upload_is_logged_not_failed() {
        let loader = HistoryLoader::new(Arc::new(MemoryStore::new()));
        let turns = loader.load_history("u1", "s1").await.unwrap();
        assert!(turns.is_empty());
        assert!(logs_contain("session has no upload"));
    }

    #[tokio::test]
    async fn upload_precedes_messages() {
        let store = MemoryStore::new();
        store
            .save_message(&NewMessage::new("u1", "s1", Role::User, "hi"))
            .await
            .unwrap();
        store
            .save_upload(&NewUpload {
                user_id: "u1".into(),
                session_id: "s1".into(),
                filename: "a.png".into(),
                content_type: "image/png".into(),
                bytes: vec![7],
            })
            .await
            .unwrap();

        let turns = HistoryLoader::new(Arc::new(store))
            .load_history("u1", "s1")
            .await
            .unwrap();
        assert_eq!(
            turns,
            vec![
                ContextTurn::media(Role::User, "image/png", vec![7]),
                ContextTurn::text(Role::User, "hi"),
            ]
        );
    }

    #[tokio::test]
    async fn store_failure_aborts_load() {
        let store = MemoryStore::new();
        store.fail_reads(true);
        let err = HistoryLoader::new(Arc::new(store))
            .load_history("u1", "s1")
            .await
            .unwrap_err();
        assert!(matches!(err, StoriaError::Storage { .. }));
    }
}
