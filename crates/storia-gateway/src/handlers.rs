// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.

use axum::{
    Extension, Json,
    extract::{
        Multipart, Path, Query, State, multipart::MultipartRejection, rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use storia_chat::story::upload_content_type;
use storia_core::types::{Identity, NewUpload, User};
use storia_core::{ErrorKind, HealthStatus, Role};

use crate::auth::resolve_user_id;
use crate::error::ApiError;
use crate::server::GatewayState;

/// Multipart content type browsers send when they do not know better.
const OPAQUE_CONTENT_TYPE: &str = "application/octet-stream";

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub storage: String,
}

/// Request body for POST /api/user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for POST /api/login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `user_id` and `session_id` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SessionQuery {
    pub user_id: Option<String>,
    pub session_id: Option<String>,
}

impl SessionQuery {
    pub fn session_id(&self) -> Option<&str> {
        self.session_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// A story as returned by POST /api/upload.
#[derive(Debug, Serialize)]
pub struct StoryBody {
    pub id: i64,
    pub sender: Role,
    pub content: String,
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

fn identity(ext: &Option<Extension<Identity>>) -> Option<&Identity> {
    ext.as_ref().map(|Extension(identity)| identity)
}

/// GET /health
///
/// Reports the storage health check. Unhealthy storage answers 503.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let (status, storage) = match state.sessions.health_check().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("unhealthy: {reason}"),
        ),
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    let body = HealthResponse {
        status: if status.is_success() { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        storage,
    };
    (status, Json(body)).into_response()
}

/// POST /api/user
///
/// Every registration failure is a 400.
pub async fn create_user(
    State(state): State<GatewayState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let body = json_body(body)?;
    let user = state
        .users
        .register(&body.name, &body.email, &body.password)
        .await
        .map_err(|e| {
            if e.kind() == ErrorKind::Internal {
                warn!(error = %e, "registration failed");
            }
            ApiError::bad_request(e.to_string())
        })?;
    Ok(Json(json!({ "success": true, "id": user.id })))
}

/// GET /api/user/{email}
pub async fn get_user(
    State(state): State<GatewayState>,
    Path(email): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user: User = state.users.get_by_email(&email).await?;
    Ok(Json(json!({ "user": user })))
}

/// POST /api/login
///
/// Sets the session cookie on success. Unknown accounts and wrong
/// passwords are both 401.
pub async fn login(
    State(state): State<GatewayState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<serde_json::Value>), ApiError> {
    let body = json_body(body)?;
    let token = match state.users.authenticate(&body.email, &body.password).await {
        Ok(token) => token,
        Err(e) => {
            return Err(match e.kind() {
                ErrorKind::NotFound | ErrorKind::Unauthorized => {
                    ApiError::unauthorized(e.to_string())
                }
                _ => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            });
        }
    };

    let auth = &state.auth;
    let mut cookie = Cookie::build((auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(auth.cookie_secure)
        .max_age(time::Duration::seconds(auth.cookie_max_age_secs));
    if let Some(domain) = &auth.cookie_domain {
        cookie = cookie.domain(domain.clone());
    }

    Ok((jar.add(cookie), Json(json!({ "success": true }))))
}

/// POST /api/upload?user_id&session_id
///
/// Stores the `file` field as the session's upload and answers with the
/// generated opening story.
pub async fn upload(
    State(state): State<GatewayState>,
    ext: Option<Extension<Identity>>,
    Query(query): Query<SessionQuery>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut multipart = multipart.map_err(|r| ApiError::bad_request(r.body_text()))?;
    let user_id = resolve_user_id(query.user_id.as_deref(), identity(&ext))?;
    let session_id = query
        .session_id()
        .ok_or_else(ApiError::missing_values)?
        .to_string();

    let mut file = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let declared = field
            .content_type()
            .filter(|ct| !ct.eq_ignore_ascii_case(OPAQUE_CONTENT_TYPE))
            .map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(e.body_text()))?;
        file = Some((filename, declared, bytes));
        break;
    }
    let (filename, declared, bytes) = file.ok_or_else(ApiError::missing_values)?;

    let content_type = upload_content_type(&filename, declared.as_deref())?;
    let story = state
        .stories
        .create_story(NewUpload {
            user_id,
            session_id,
            filename,
            content_type,
            bytes: bytes.to_vec(),
        })
        .await?;
    info!(session_id = %story.session_id, "story created");

    let body = StoryBody {
        id: story.id,
        sender: story.sender,
        content: story.content,
    };
    Ok(Json(json!({ "story": body })))
}

/// GET /api/stories?user_id
pub async fn list_stories(
    State(state): State<GatewayState>,
    ext: Option<Extension<Identity>>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let user_id = resolve_user_id(query.user_id.as_deref(), identity(&ext))?;
    let stories = state.stories.list_stories(&user_id).await?;
    Ok(Json(json!({ "stories": stories })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_session_id_is_missing() {
        let query = SessionQuery {
            user_id: Some("u1".into()),
            session_id: Some("  ".into()),
        };
        assert!(query.session_id().is_none());
        assert!(SessionQuery::default().session_id().is_none());
    }

    #[test]
    fn story_body_serializes_sender_lowercase() {
        let body = StoryBody {
            id: 7,
            sender: Role::Model,
            content: "once".into(),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"id": 7, "sender": "model", "content": "once"})
        );
    }
}
