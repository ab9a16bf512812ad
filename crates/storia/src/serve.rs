// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `storia serve` command implementation.
//!
//! Connects PostgreSQL storage, creates the one Gemini backend, and runs the
//! gateway until SIGINT or SIGTERM.

use std::sync::Arc;

use tracing::{info, warn};

use storia_auth::JwtService;
use storia_config::StoriaConfig;
use storia_core::{PluginAdapter, StoriaError};
use storia_gateway::{GatewayState, start_server};
use storia_gemini::GeminiBackend;
use storia_storage::PostgresStorage;

use crate::shutdown;

/// Runs the `storia serve` command.
pub async fn run_serve(config: StoriaConfig) -> Result<(), StoriaError> {
    info!("starting storia serve");

    // Secrets only `serve` needs are checked before touching the database.
    let tokens = Arc::new(JwtService::from_config(&config.auth)?);
    let backend = Arc::new(GeminiBackend::new(&config.gemini)?);
    info!(model = %config.gemini.model, "generative backend ready");

    let storage = Arc::new(PostgresStorage::connect(&config.database)?);
    storage.initialize().await?;
    info!("storage initialized");

    if !config.auth.require_auth {
        warn!("auth.require_auth is false: protected routes are open");
    }

    let shutdown = shutdown::install_signal_handler();
    let state = GatewayState::new(
        storage.clone(),
        storage.clone(),
        backend.clone(),
        tokens,
        &config,
        shutdown,
    );

    let served = start_server(&config.server, state).await;

    if let Err(e) = backend.shutdown().await {
        warn!(error = %e, "backend shutdown failed");
    }
    if let Err(e) = storage.shutdown().await {
        warn!(error = %e, "storage shutdown failed");
    }
    info!("storia stopped");
    served
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the configured level.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

fn default_filter(log_level: &str) -> String {
    format!("storia={log_level},warn")
}
