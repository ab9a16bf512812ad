// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use storia_auth::{JwtService, UserService};
use storia_chat::{RelayOptions, StoryService};
use storia_config::{AuthConfig, ChatConfig, ServerConfig, StoriaConfig};
use storia_core::{GenerativeBackend, SessionStore, StoriaError, UserStore};

use crate::auth::auth_middleware;
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Session storage, also checked by `/health`.
    pub sessions: Arc<dyn SessionStore>,
    pub users: UserService,
    pub stories: StoryService,
    /// The one generative backend shared by every connection.
    pub backend: Arc<dyn GenerativeBackend>,
    pub auth: Arc<AuthConfig>,
    pub chat: Arc<ChatConfig>,
    /// Parent of every connection's cancellation token.
    pub shutdown: CancellationToken,
}

impl GatewayState {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        backend: Arc<dyn GenerativeBackend>,
        tokens: Arc<JwtService>,
        config: &StoriaConfig,
        shutdown: CancellationToken,
    ) -> Self {
        let stories = StoryService::new(
            Arc::clone(&sessions),
            Arc::clone(&backend),
            config.chat.story_prompt.clone(),
        );
        Self {
            sessions,
            users: UserService::new(users, tokens),
            stories,
            backend,
            auth: Arc::new(config.auth.clone()),
            chat: Arc::new(config.chat.clone()),
            shutdown,
        }
    }

    pub fn relay_options(&self) -> RelayOptions {
        RelayOptions {
            persistence: self.chat.persistence,
            send_history: self.chat.send_history_on_connect,
        }
    }
}

/// Build the gateway router.
///
/// Public routes:
/// - GET /health
/// - POST /api/user
/// - POST /api/login
///
/// Routes behind [`auth_middleware`]:
/// - GET /api/user/{email}
/// - POST /api/upload
/// - GET /api/stories
/// - GET /api/story/ws
pub fn build_router(state: GatewayState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/user", post(handlers::create_user))
        .route("/api/login", post(handlers::login))
        .with_state(state.clone());

    let api_routes = Router::new()
        .route("/api/user/{email}", get(handlers::get_user))
        .route("/api/upload", post(handlers::upload))
        .route("/api/stories", get(handlers::list_stories))
        .route("/api/story/ws", get(ws::story_ws))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state.clone());

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(state.chat.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the gateway HTTP/WebSocket server.
///
/// Runs until the state's shutdown token is cancelled, then drains
/// in-flight requests.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), StoriaError> {
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| StoriaError::Transport {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| StoriaError::Transport {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storia_core::PersistenceMode;
    use storia_test_utils::{MemoryStore, MockBackend};

    fn state(config: &StoriaConfig) -> GatewayState {
        let store = MemoryStore::new();
        GatewayState::new(
            Arc::new(store.clone()),
            Arc::new(store),
            Arc::new(MockBackend::new()),
            Arc::new(JwtService::new("secret", 60)),
            config,
            CancellationToken::new(),
        )
    }

    #[test]
    fn relay_options_follow_chat_config() {
        let mut config = StoriaConfig::default();
        config.chat.persistence = PersistenceMode::Strict;
        config.chat.send_history_on_connect = false;

        let options = state(&config).relay_options();
        assert_eq!(options.persistence, PersistenceMode::Strict);
        assert!(!options.send_history);
    }

    #[test]
    fn gateway_state_is_clone() {
        let state = state(&StoriaConfig::default());
        let cloned = state.clone();
        assert!(Arc::ptr_eq(&state.auth, &cloned.auth));
    }
}
