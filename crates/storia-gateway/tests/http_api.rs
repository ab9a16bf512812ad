// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! REST routes driven through the router with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use storia_auth::JwtService;
use storia_config::StoriaConfig;
use storia_core::{Role, SessionStore};
use storia_gateway::{GatewayState, build_router};
use storia_test_utils::{MemoryStore, MockBackend, ScriptedReply};

struct Harness {
    app: Router,
    store: MemoryStore,
    backend: MockBackend,
}

fn harness(config: StoriaConfig) -> Harness {
    let store = MemoryStore::new();
    let backend = MockBackend::new();
    let state = GatewayState::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(backend.clone()),
        Arc::new(JwtService::new("test-secret", 600)),
        &config,
        CancellationToken::new(),
    );
    Harness {
        app: build_router(state),
        store,
        backend,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<(String, String)>, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response
        .headers()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or_default().to_string()))
        .collect();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    };
    (status, headers, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn multipart(uri: &str, token: &str, filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "storia-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

/// Registers Ada and returns her id and a bearer token.
async fn register_and_login(app: &Router) -> (String, String) {
    let (status, _, body) = send(
        app,
        post_json(
            "/api/user",
            json!({"name": "Ada", "email": "ada@example.com", "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let user_id = body["id"].as_str().unwrap().to_string();

    let (status, headers, _) = send(
        app,
        post_json("/api/login", json!({"email": "ada@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let cookie = headers
        .iter()
        .find(|(k, _)| k == "set-cookie")
        .map(|(_, v)| v.clone())
        .unwrap();
    let token = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("token="))
        .unwrap()
        .to_string();
    (user_id, token)
}

#[tokio::test]
async fn health_reports_storage() {
    let h = harness(StoriaConfig::default());
    let (status, _, body) = send(&h.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "healthy");

    h.store.fail_reads(true);
    let (status, _, body) = send(&h.app, get("/health", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
}

#[tokio::test]
async fn register_rejects_duplicates_and_bad_input() {
    let h = harness(StoriaConfig::default());
    register_and_login(&h.app).await;

    let (status, _, body) = send(
        &h.app,
        post_json(
            "/api/user",
            json!({"name": "Ada", "email": "ada@example.com", "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _, _) = send(&h.app, post_json("/api/user", json!({"email": "x@y.z"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let malformed = Request::post("/api/user")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&h.app, malformed).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn login_sets_session_cookie() {
    let h = harness(StoriaConfig::default());
    send(
        &h.app,
        post_json(
            "/api/user",
            json!({"name": "Ada", "email": "ada@example.com", "password": "pw"}),
        ),
    )
    .await;

    let (status, headers, body) = send(
        &h.app,
        post_json("/api/login", json!({"email": "ada@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"success": true}));
    let cookie = &headers.iter().find(|(k, _)| k == "set-cookie").unwrap().1;
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("Max-Age=3600"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test]
async fn login_failures_are_unauthorized() {
    let h = harness(StoriaConfig::default());
    register_and_login(&h.app).await;

    let (status, headers, _) = send(
        &h.app,
        post_json("/api/login", json!({"email": "ada@example.com", "password": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!headers.iter().any(|(k, _)| k == "set-cookie"));

    let (status, _, _) = send(
        &h.app,
        post_json("/api/login", json!({"email": "who@example.com", "password": "pw"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn get_user_requires_token_and_hides_hash() {
    let h = harness(StoriaConfig::default());
    let (user_id, token) = register_and_login(&h.app).await;

    let (status, _, _) = send(&h.app, get("/api/user/ada@example.com", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, _) = send(&h.app, get("/api/user/ada@example.com", Some("garbage"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _, body) = send(&h.app, get("/api/user/ada@example.com", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"user": {"id": user_id, "name": "Ada", "email": "ada@example.com"}})
    );

    let (status, _, _) = send(&h.app, get("/api/user/who@example.com", Some(&token))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cookie_authenticates_like_bearer() {
    let h = harness(StoriaConfig::default());
    let (_, token) = register_and_login(&h.app).await;

    let request = Request::get("/api/stories")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&h.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"stories": []}));
}

#[tokio::test]
async fn upload_generates_and_lists_story() {
    let h = harness(StoriaConfig::default());
    let (user_id, token) = register_and_login(&h.app).await;
    h.backend.push_reply(ScriptedReply::Text("a tale of pixels".into()));

    let uri = format!("/api/upload?user_id={user_id}&session_id=s1");
    let (status, _, body) = send(
        &h.app,
        multipart(&uri, &token, "Photo.PNG", "image/png", b"\x89PNG"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["story"]["sender"], "model");
    assert_eq!(body["story"]["content"], "a tale of pixels");
    assert!(body["story"]["id"].is_i64());

    let upload = h.store.find_upload(&user_id, "s1").await.unwrap().unwrap();
    assert_eq!(upload.content_type, "image/png");
    assert_eq!(upload.filename, "Photo.PNG");
    let messages = h.store.list_messages(&user_id, "s1").await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].sender, Role::Model);

    // user_id defaults to the token's user.
    let (status, _, body) = send(&h.app, get("/api/stories", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"stories": ["s1"]}));

    // A session holds one upload.
    let (status, _, _) = send(
        &h.app,
        multipart(&uri, &token, "again.png", "image/png", b"x"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn opaque_content_type_falls_back_to_extension() {
    let h = harness(StoriaConfig::default());
    let (user_id, token) = register_and_login(&h.app).await;

    let uri = "/api/upload?session_id=s2";
    let (status, _, _) = send(
        &h.app,
        multipart(uri, &token, "notes.txt", "application/octet-stream", b"hello"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let upload = h.store.find_upload(&user_id, "s2").await.unwrap().unwrap();
    assert_eq!(upload.content_type, "text/plain");
}

#[tokio::test]
async fn upload_rejects_bad_requests_before_storing() {
    let h = harness(StoriaConfig::default());
    let (user_id, token) = register_and_login(&h.app).await;

    let (status, _, body) = send(
        &h.app,
        multipart("/api/upload", &token, "a.png", "image/png", b"x"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "missing values"}));

    let uri = format!("/api/upload?user_id={user_id}&session_id=s1");
    let (status, _, body) = send(
        &h.app,
        multipart(&uri, &token, "tool.exe", "application/x-msdownload", b"MZ"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("unknown or unsupported file format")
    );
    assert!(h.store.find_upload(&user_id, "s1").await.unwrap().is_none());
    assert!(h.backend.generate_calls().is_empty());

    let uri = "/api/upload?user_id=someone-else&session_id=s1";
    let (status, _, _) = send(&h.app, multipart(uri, &token, "a.png", "image/png", b"x")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn generation_failure_keeps_upload() {
    let h = harness(StoriaConfig::default());
    let (user_id, token) = register_and_login(&h.app).await;
    h.backend.push_reply(ScriptedReply::Empty);

    let uri = "/api/upload?session_id=s1";
    let (status, _, body) = send(&h.app, multipart(uri, &token, "a.jpg", "image/jpeg", b"x")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(
        body["error"]
            .as_str()
            .unwrap()
            .contains("not found response text")
    );
    assert!(h.store.find_upload(&user_id, "s1").await.unwrap().is_some());
    assert!(h.store.list_messages(&user_id, "s1").await.unwrap().is_empty());
}

#[tokio::test]
async fn open_mode_needs_explicit_user_id() {
    let mut config = StoriaConfig::default();
    config.auth.require_auth = false;
    let h = harness(config);

    let (status, _, body) = send(&h.app, get("/api/stories", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "missing values"}));

    let (status, _, body) = send(&h.app, get("/api/stories?user_id=u1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"stories": []}));
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let mut config = StoriaConfig::default();
    config.chat.max_upload_bytes = 64;
    let h = harness(config);
    let token = JwtService::new("test-secret", 600)
        .issue("u1", "ada@example.com")
        .unwrap();

    let (status, _, _) = send(
        &h.app,
        multipart("/api/upload?session_id=s1", &token, "a.png", "image/png", &[0u8; 512]),
    )
    .await;
    assert!(status.is_client_error(), "got {status}");
    assert!(h.store.find_upload("u1", "s1").await.unwrap().is_none());
}
