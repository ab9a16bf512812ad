// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User account queries.

use tokio_postgres::Row;

use storia_core::StoriaError;
use storia_core::types::{NewUser, User};

use crate::database::{Database, map_pg_err};

fn from_row(row: &Row) -> Result<User, StoriaError> {
    Ok(User {
        id: row.try_get("id").map_err(StoriaError::storage)?,
        name: row.try_get("name").map_err(StoriaError::storage)?,
        email: row.try_get("email").map_err(StoriaError::storage)?,
        password_hash: row.try_get("password_hash").map_err(StoriaError::storage)?,
    })
}

/// Look a user up by email.
pub async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, StoriaError> {
    let client = db.client().await?;
    let row = client
        .query_opt(
            "SELECT id, name, email, password_hash FROM users WHERE email = $1",
            &[&email],
        )
        .await
        .map_err(StoriaError::storage)?;
    row.as_ref().map(from_row).transpose()
}

/// Insert an account. Duplicate emails are invalid input.
pub async fn insert_user(db: &Database, user: &NewUser) -> Result<User, StoriaError> {
    let client = db.client().await?;
    let row = client
        .query_one(
            "INSERT INTO users (id, name, email, password_hash)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, email, password_hash",
            &[&user.id, &user.name, &user.email, &user.password_hash],
        )
        .await
        .map_err(|e| map_pg_err(e, &format!("email {} is already registered", user.email)))?;
    from_row(&row)
}
