// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `storia init-db` and `storia add-user`.

use std::sync::Arc;

use tracing::info;

use storia_auth::{JwtService, UserService};
use storia_config::StoriaConfig;
use storia_core::{PluginAdapter, StoriaError};
use storia_storage::PostgresStorage;

/// Environment variable read by `add-user` before prompting.
const PASSWORD_ENV: &str = "STORIA_USER_PASSWORD";

/// Create the schema, then exit.
pub async fn run_init_db(config: &StoriaConfig) -> Result<(), StoriaError> {
    let storage = PostgresStorage::connect(&config.database)?;
    storage.initialize().await?;
    storage.shutdown().await?;
    println!("storia: database schema is up to date");
    Ok(())
}

/// Register an account from the command line.
pub async fn run_add_user(config: &StoriaConfig, name: &str, email: &str) -> Result<(), StoriaError> {
    let password = read_password(std::env::var(PASSWORD_ENV).ok())?;

    let storage = Arc::new(PostgresStorage::connect(&config.database)?);
    storage.initialize().await?;

    // Registration never issues a token; the secret only has to be non-empty.
    let tokens = JwtService::from_config(&config.auth)
        .unwrap_or_else(|_| JwtService::new("add-user", config.auth.token_ttl_secs));
    let users = UserService::new(storage.clone(), Arc::new(tokens));
    let user = users.register(name, email, &password).await?;
    info!(user_id = %user.id, "account created from the command line");
    println!("storia: created user {} ({})", user.email, user.id);

    storage.shutdown().await
}

/// Password from the environment, or prompted for twice on the terminal.
fn read_password(from_env: Option<String>) -> Result<String, StoriaError> {
    if let Some(password) = from_env.filter(|p| !p.is_empty()) {
        return Ok(password);
    }

    let prompt = |label: &str| {
        rpassword::prompt_password(label)
            .map_err(|e| StoriaError::Internal(format!("failed to read password: {e}")))
    };
    let first = prompt("Password: ")?;
    let second = prompt("Repeat password: ")?;
    if first != second {
        return Err(StoriaError::InvalidInput("passwords do not match".into()));
    }
    Ok(first)
}
