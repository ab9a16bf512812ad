// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent schema bootstrap.

use tracing::info;

use storia_core::StoriaError;

use crate::database::Database;

/// Tables and indexes, created only when absent.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    name          TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE CHECK (email <> ''),
    password_hash TEXT NOT NULL,
    created_at    TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS messages (
    id         BIGSERIAL PRIMARY KEY,
    user_id    TEXT NOT NULL,
    session_id TEXT NOT NULL,
    sender     TEXT NOT NULL CHECK (sender IN ('user', 'model')),
    content    TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp()
);

CREATE INDEX IF NOT EXISTS idx_messages_session
    ON messages (user_id, session_id, created_at, id);

CREATE TABLE IF NOT EXISTS uploads (
    id           BIGSERIAL PRIMARY KEY,
    user_id      TEXT NOT NULL,
    session_id   TEXT NOT NULL,
    filename     TEXT NOT NULL,
    content_type TEXT NOT NULL,
    bytes        BYTEA NOT NULL,
    created_at   TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(),
    UNIQUE (user_id, session_id)
);
"#;

/// Create every table and index that does not exist yet.
pub async fn apply(db: &Database) -> Result<(), StoriaError> {
    let client = db.client().await?;
    client
        .batch_execute(SCHEMA)
        .await
        .map_err(StoriaError::storage)?;
    info!("database schema is up to date");
    Ok(())
}
