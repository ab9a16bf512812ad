// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opening stories for uploaded files, and the story listing.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use storia_core::types::{ContextTurn, Message, NewMessage, NewUpload, TurnPart};
use storia_core::{GenerativeBackend, Role, SessionStore, StoriaError};

/// Media type implied by a file name's extension, if it is a supported one.
///
/// The comparison is case-insensitive.
pub fn media_type_for(filename: &str) -> Result<&'static str, StoriaError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("jpg" | "jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("pdf") => Ok("application/pdf"),
        Some("txt") => Ok("text/plain"),
        _ => Err(StoriaError::InvalidInput(
            "unknown or unsupported file format".into(),
        )),
    }
}

/// Content type to store for an upload: the declared one when present,
/// otherwise the extension's. The extension must be supported either way.
pub fn upload_content_type(filename: &str, declared: Option<&str>) -> Result<String, StoriaError> {
    let implied = media_type_for(filename)?;
    Ok(declared
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(implied)
        .to_string())
}

/// Creates and lists stories.
#[derive(Clone)]
pub struct StoryService {
    store: Arc<dyn SessionStore>,
    backend: Arc<dyn GenerativeBackend>,
    prompt: String,
}

impl StoryService {
    pub fn new(
        store: Arc<dyn SessionStore>,
        backend: Arc<dyn GenerativeBackend>,
        prompt: impl Into<String>,
    ) -> Self {
        Self {
            store,
            backend,
            prompt: prompt.into(),
        }
    }

    /// Store the upload, ask the backend for a story about it, and store the
    /// story as the session's first model turn.
    ///
    /// The upload is kept even when generation fails, so the session can
    /// still be opened later.
    pub async fn create_story(&self, upload: NewUpload) -> Result<Message, StoriaError> {
        self.store.save_upload(&upload).await?;
        info!(
            user_id = %upload.user_id,
            session_id = %upload.session_id,
            filename = %upload.filename,
            bytes = upload.bytes.len(),
            "upload stored"
        );

        let turn = ContextTurn {
            role: Role::User,
            parts: vec![
                TurnPart::Text(self.prompt.clone()),
                TurnPart::Media {
                    mime_type: upload.content_type.clone(),
                    data: upload.bytes,
                },
            ],
        };
        let response = self.backend.generate(vec![turn]).await?;
        let story = response.first_text()?.to_string();

        self.store
            .save_message(&NewMessage::new(
                upload.user_id,
                upload.session_id,
                Role::Model,
                story,
            ))
            .await
    }

    /// Session ids of a user, oldest first.
    pub async fn list_stories(&self, user_id: &str) -> Result<Vec<String>, StoriaError> {
        self.store.list_session_ids(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storia_core::ErrorKind;
    use storia_test_utils::{MemoryStore, MockBackend, ScriptedReply};

    fn upload(filename: &str) -> NewUpload {
        NewUpload {
            user_id: "u1".into(),
            session_id: "s1".into(),
            filename: filename.into(),
            content_type: "image/png".into(),
            bytes: vec![1, 2, 3],
        }
    }

    #[test]
    fn supported_extensions() {
        assert_eq!(media_type_for("a.JPG").unwrap(), "image/jpeg");
        assert_eq!(media_type_for("a.jpeg").unwrap(), "image/jpeg");
        assert_eq!(media_type_for("dir/a.png").unwrap(), "image/png");
        assert_eq!(media_type_for("a.pdf").unwrap(), "application/pdf");
        assert_eq!(media_type_for("notes.txt").unwrap(), "text/plain");
        for bad in ["a.gif", "noext", "", ".png.exe"] {
            let err = media_type_for(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "{bad}");
        }
    }

    #[test]
    fn declared_content_type_wins_when_present() {
        assert_eq!(upload_content_type("a.png", Some("image/x-png")).unwrap(), "image/x-png");
        assert_eq!(upload_content_type("a.png", Some("  ")).unwrap(), "image/png");
        assert_eq!(upload_content_type("a.png", None).unwrap(), "image/png");
        assert!(upload_content_type("a.gif", Some("image/gif")).is_err());
    }

    #[tokio::test]
    async fn story_is_generated_from_prompt_and_media() {
        let store = MemoryStore::new();
        let backend = MockBackend::with_replies([ScriptedReply::Text("A cat naps.".into())]);
        let service = StoryService::new(
            Arc::new(store.clone()),
            Arc::new(backend.clone()),
            "Describe this",
        );

        let story = service.create_story(upload("cat.png")).await.unwrap();
        assert_eq!(story.sender, Role::Model);
        assert_eq!(story.content, "A cat naps.");

        let calls = backend.generate_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0][0].parts,
            vec![
                TurnPart::Text("Describe this".into()),
                TurnPart::Media {
                    mime_type: "image/png".into(),
                    data: vec![1, 2, 3]
                },
            ]
        );
        assert!(store.find_upload("u1", "s1").await.unwrap().is_some());
        assert_eq!(service.list_stories("u1").await.unwrap(), ["s1"]);
    }

    #[tokio::test]
    async fn second_upload_is_rejected_before_generation() {
        let store = MemoryStore::new();
        let backend = MockBackend::new();
        let service = StoryService::new(Arc::new(store), Arc::new(backend.clone()), "p");

        service.create_story(upload("a.png")).await.unwrap();
        let err = service.create_story(upload("b.png")).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(backend.generate_calls().len(), 1);
    }

    #[tokio::test]
    async fn empty_response_is_a_backend_error() {
        let store = MemoryStore::new();
        let backend = MockBackend::with_replies([ScriptedReply::Empty]);
        let service = StoryService::new(Arc::new(store.clone()), Arc::new(backend), "p");

        let err = service.create_story(upload("a.png")).await.unwrap_err();
        assert!(err.to_string().contains("not found response text"));
        assert_eq!(store.message_count().await, 0);
    }
}
