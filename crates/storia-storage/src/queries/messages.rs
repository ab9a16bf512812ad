// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message queries.

use std::str::FromStr;

use tokio_postgres::Row;

use storia_core::types::{Message, NewMessage};
use storia_core::{Role, StoriaError};

use crate::database::Database;

const COLUMNS: &str = "id, user_id, session_id, sender, content, created_at";

fn from_row(row: &Row) -> Result<Message, StoriaError> {
    let sender: String = row.try_get("sender").map_err(StoriaError::storage)?;
    let sender = Role::from_str(&sender).map_err(|_| StoriaError::Storage {
        source: format!("unknown sender `{sender}` in messages table").into(),
    })?;
    Ok(Message {
        id: row.try_get("id").map_err(StoriaError::storage)?,
        user_id: row.try_get("user_id").map_err(StoriaError::storage)?,
        session_id: row.try_get("session_id").map_err(StoriaError::storage)?,
        sender,
        content: row.try_get("content").map_err(StoriaError::storage)?,
        created_at: row.try_get("created_at").map_err(StoriaError::storage)?,
    })
}

/// Append a message; the database assigns id and timestamp.
pub async fn insert_message(db: &Database, msg: &NewMessage) -> Result<Message, StoriaError> {
    let client = db.client().await?;
    let row = client
        .query_one(
            &format!(
                "INSERT INTO messages (user_id, session_id, sender, content)
                 VALUES ($1, $2, $3, $4)
                 RETURNING {COLUMNS}"
            ),
            &[
                &msg.user_id,
                &msg.session_id,
                &msg.sender.as_str(),
                &msg.content,
            ],
        )
        .await
        .map_err(StoriaError::storage)?;
    from_row(&row)
}

/// Messages of one session in chronological order, ties broken by id.
pub async fn list_for_session(
    db: &Database,
    user_id: &str,
    session_id: &str,
) -> Result<Vec<Message>, StoriaError> {
    let client = db.client().await?;
    let rows = client
        .query(
            &format!(
                "SELECT {COLUMNS} FROM messages
                 WHERE user_id = $1 AND session_id = $2
                 ORDER BY created_at ASC, id ASC"
            ),
            &[&user_id, &session_id],
        )
        .await
        .map_err(StoriaError::storage)?;
    rows.iter().map(from_row).collect()
}

/// Distinct session ids of a user, earliest activity first.
///
/// A session counts from its upload or its first message, whichever is older.
pub async fn list_session_ids(db: &Database, user_id: &str) -> Result<Vec<String>, StoriaError> {
    let client = db.client().await?;
    let rows = client
        .query(
            "SELECT session_id FROM (
                 SELECT session_id, created_at FROM messages WHERE user_id = $1
                 UNION ALL
                 SELECT session_id, created_at FROM uploads WHERE user_id = $1
             ) AS activity
             GROUP BY session_id
             ORDER BY MIN(created_at) ASC, session_id ASC",
            &[&user_id],
        )
        .await
        .map_err(StoriaError::storage)?;
    rows.iter()
        .map(|row| row.try_get(0).map_err(StoriaError::storage))
        .collect()
}
