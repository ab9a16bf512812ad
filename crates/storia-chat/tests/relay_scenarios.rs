// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end relay runs against the in-memory store and scripted backend.

use std::sync::Arc;

use serde_json::{Value, json};

use storia_chat::{RelayExit, RelayOptions, TurnRelay};
use storia_core::types::{ContextTurn, NewUpload};
use storia_core::{PersistenceMode, Role, SessionStore};
use storia_test_utils::{MemoryStore, MockBackend, MockTransport, ScriptedReply};

fn relay(store: &MemoryStore, backend: &MockBackend, options: RelayOptions) -> TurnRelay {
    TurnRelay::new(
        "u1",
        "s1",
        Arc::new(store.clone()),
        Arc::new(backend.clone()),
        options,
    )
}

fn history_frame(frame: &str) -> Value {
    serde_json::from_str(frame).unwrap()
}

async fn save_png(store: &MemoryStore, bytes: &[u8]) {
    store
        .save_upload(&NewUpload {
            user_id: "u1".into(),
            session_id: "s1".into(),
            filename: "b.png".into(),
            content_type: "image/png".into(),
            bytes: bytes.to_vec(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn empty_session_seeds_empty_chat() {
    let store = MemoryStore::new();
    let backend = MockBackend::with_replies([ScriptedReply::Text("hello".into())]);
    let mut transport = MockTransport::new(["hi"]);
    let handle = transport.handle();

    let exit = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::ClientClosed);
    assert_eq!(backend.seeded_histories(), vec![Vec::<ContextTurn>::new()]);
    let sent = handle.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(
        history_frame(&sent[0]),
        json!({"type": "history", "turns": []})
    );
    assert_eq!(sent[1], "hello");
    assert!(handle.closed());
}

#[tokio::test]
async fn upload_and_exchange_are_replayed_in_order() {
    let store = MemoryStore::new();
    save_png(&store, b"b").await;
    let backend = MockBackend::with_replies([
        ScriptedReply::Text("hello".into()),
        ScriptedReply::Text("again".into()),
    ]);

    let mut first = MockTransport::new(["hi"]);
    relay(&store, &backend, RelayOptions::default())
        .run(&mut first)
        .await
        .unwrap();

    let mut second = MockTransport::new(["more"]);
    let handle = second.handle();
    relay(&store, &backend, RelayOptions::default())
        .run(&mut second)
        .await
        .unwrap();

    let seeded = backend.seeded_histories();
    assert_eq!(seeded.len(), 2);
    assert_eq!(
        seeded[1],
        vec![
            ContextTurn::media(Role::User, "image/png", b"b".to_vec()),
            ContextTurn::text(Role::User, "hi"),
            ContextTurn::text(Role::Model, "hello"),
        ]
    );
    assert_eq!(
        history_frame(&handle.sent()[0]),
        json!({
            "type": "history",
            "turns": [
                {"role": "user", "parts": [{"mime_type": "image/png", "size": 1}]},
                {"role": "user", "parts": [{"text": "hi"}]},
                {"role": "model", "parts": [{"text": "hello"}]}
            ]
        })
    );
    assert_eq!(handle.sent()[1], "again");
    assert_eq!(store.message_count().await, 4);
}

#[tokio::test]
async fn empty_backend_response_closes_without_reply() {
    let store = MemoryStore::new();
    let backend = MockBackend::with_replies([ScriptedReply::Empty]);
    let mut transport = MockTransport::new(["hi", "never read"]);
    let handle = transport.handle();

    let exit = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::BackendFailed);
    // Only the history frame went out.
    assert_eq!(handle.sent().len(), 1);
    assert!(handle.closed());
    assert_eq!(store.message_count().await, 0);
    assert_eq!(backend.sent_turns(), vec!["hi".to_string()]);
}

#[tokio::test]
async fn media_first_part_is_a_backend_failure() {
    let store = MemoryStore::new();
    let backend = MockBackend::with_replies([ScriptedReply::Media {
        mime_type: "image/png".into(),
        data: vec![1, 2],
    }]);
    let mut transport = MockTransport::new(["draw it"]);

    let exit = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::BackendFailed);
    assert_eq!(store.message_count().await, 0);
}

#[tokio::test]
async fn backend_error_is_a_backend_failure() {
    let store = MemoryStore::new();
    let backend = MockBackend::with_replies([ScriptedReply::Error("quota".into())]);
    let mut transport = MockTransport::new(["hi"]);

    let exit = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::BackendFailed);
}

#[tokio::test]
async fn best_effort_replies_when_writes_fail() {
    let store = MemoryStore::new();
    store.fail_user_writes(true);
    store.fail_model_writes(true);
    let backend = MockBackend::with_replies([ScriptedReply::Text("hello".into())]);
    let mut transport = MockTransport::new(["hi"]);
    let handle = transport.handle();

    let exit = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::ClientClosed);
    assert_eq!(handle.sent().last().map(String::as_str), Some("hello"));
    assert_eq!(store.message_count().await, 0);
}

#[tokio::test]
async fn strict_mode_closes_without_reply_when_model_write_fails() {
    let store = MemoryStore::new();
    store.fail_model_writes(true);
    let backend = MockBackend::with_replies([ScriptedReply::Text("hello".into())]);
    let mut transport = MockTransport::new(["hi"]);
    let handle = transport.handle();
    let options = RelayOptions {
        persistence: PersistenceMode::Strict,
        send_history: false,
    };

    let exit = relay(&store, &backend, options)
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::PersistenceFailed);
    assert!(handle.sent().is_empty());
    assert!(handle.closed());
    // The user turn was already stored.
    let stored = store.all_messages().await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].sender, Role::User);
}

#[tokio::test]
async fn read_error_ends_with_transport_failure() {
    let store = MemoryStore::new();
    let backend = MockBackend::new();
    let mut transport = MockTransport::new(["hi"]).then_error("connection reset");
    let handle = transport.handle();

    let exit = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::TransportFailed);
    assert_eq!(handle.sent().last().map(String::as_str), Some("echo: hi"));
    assert_eq!(store.message_count().await, 2);
}

#[tokio::test]
async fn failed_history_send_ends_with_transport_failure() {
    let store = MemoryStore::new();
    let backend = MockBackend::new();
    let mut transport = MockTransport::new(["hi"]).failing_sends();

    let exit = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await
        .unwrap();

    assert_eq!(exit, RelayExit::TransportFailed);
    assert!(backend.sent_turns().is_empty());
}

#[tokio::test]
async fn seeding_failure_is_returned_and_closes_transport() {
    let store = MemoryStore::new();
    store.fail_reads(true);
    let backend = MockBackend::new();
    let mut transport = MockTransport::new(["hi"]);
    let handle = transport.handle();

    let result = relay(&store, &backend, RelayOptions::default())
        .run(&mut transport)
        .await;

    assert!(result.is_err());
    let sent = handle.sent();
    assert_eq!(sent.len(), 1);
    let frame: Value = serde_json::from_str(&sent[0]).unwrap();
    assert!(frame["error"].as_str().unwrap().contains("storage error"));
    assert!(handle.closed());
    assert!(backend.seeded_histories().is_empty());
}
