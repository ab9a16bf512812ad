// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authentication middleware for the gateway.
//!
//! A session token is accepted from (checked in order):
//! 1. the session cookie (name from `auth.cookie_name`)
//! 2. an `Authorization: Bearer <token>` header
//!
//! A verified token becomes an [`Identity`] request extension. With
//! `auth.require_auth = false` requests pass through without one.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use storia_core::types::Identity;

use crate::error::ApiError;
use crate::server::GatewayState;

/// Extracts the raw session token from request headers.
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Middleware that verifies the session token and attaches the caller's
/// [`Identity`].
pub async fn auth_middleware(
    State(state): State<GatewayState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.auth.require_auth {
        return Ok(next.run(request).await);
    }

    let token = token_from_headers(request.headers(), &state.auth.cookie_name)
        .ok_or_else(|| ApiError::unauthorized("missing session token"))?;
    let claims = state.users.tokens().verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "rejected session token");
        ApiError::from(e)
    })?;

    request.extensions_mut().insert(Identity::from(claims));
    Ok(next.run(request).await)
}

/// Resolves the user a request acts for.
///
/// The `user_id` query parameter defaults to the caller's identity. When
/// both are present they must agree.
pub fn resolve_user_id(
    requested: Option<&str>,
    identity: Option<&Identity>,
) -> Result<String, ApiError> {
    let requested = requested.map(str::trim).filter(|id| !id.is_empty());
    match (requested, identity) {
        (Some(id), Some(identity)) if id != identity.user_id => Err(ApiError::unauthorized(
            "user_id does not match the session token",
        )),
        (Some(id), _) => Ok(id.to_string()),
        (None, Some(identity)) => Ok(identity.user_id.clone()),
        (None, None) => Err(ApiError::missing_values()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn identity() -> Identity {
        Identity {
            user_id: "u1".into(),
            email: "ada@example.com".into(),
        }
    }

    #[test]
    fn cookie_wins_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert("cookie", HeaderValue::from_static("other=x; token=from-cookie"));
        headers.insert("authorization", HeaderValue::from_static("Bearer from-header"));
        assert_eq!(
            token_from_headers(&headers, "token").as_deref(),
            Some("from-cookie")
        );
    }

    #[test]
    fn bearer_is_used_without_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer abc"));
        assert_eq!(token_from_headers(&headers, "token").as_deref(), Some("abc"));
    }

    #[test]
    fn no_token_found() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Basic abc"));
        assert!(token_from_headers(&headers, "token").is_none());
        assert!(token_from_headers(&HeaderMap::new(), "token").is_none());
    }

    #[test]
    fn user_id_defaults_to_identity() {
        assert_eq!(resolve_user_id(None, Some(&identity())).unwrap(), "u1");
        assert_eq!(resolve_user_id(Some(" "), Some(&identity())).unwrap(), "u1");
        assert_eq!(resolve_user_id(Some("u1"), Some(&identity())).unwrap(), "u1");
    }

    #[test]
    fn user_id_mismatch_is_rejected() {
        let err = resolve_user_id(Some("u2"), Some(&identity())).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn user_id_required_without_identity() {
        assert_eq!(resolve_user_id(Some("u9"), None).unwrap(), "u9");
        let err = resolve_user_id(None, None).unwrap_err();
        assert_eq!(err.message, "missing values");
    }
}
