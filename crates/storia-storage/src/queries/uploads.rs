// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Upload queries.

use storia_core::StoriaError;
use storia_core::types::{NewUpload, Upload};

use crate::database::{Database, map_pg_err};

/// Store the upload of a session. A session holds at most one.
pub async fn insert_upload(db: &Database, upload: &NewUpload) -> Result<i64, StoriaError> {
    let client = db.client().await?;
    let row = client
        .query_one(
            "INSERT INTO uploads (user_id, session_id, filename, content_type, bytes)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id",
            &[
                &upload.user_id,
                &upload.session_id,
                &upload.filename,
                &upload.content_type,
                &upload.bytes,
            ],
        )
        .await
        .map_err(|e| {
            map_pg_err(
                e,
                &format!("session {} already has an upload", upload.session_id),
            )
        })?;
    row.try_get(0).map_err(StoriaError::storage)
}

/// The upload of a session, if one was stored.
pub async fn find_upload(
    db: &Database,
    user_id: &str,
    session_id: &str,
) -> Result<Option<Upload>, StoriaError> {
    let client = db.client().await?;
    let row = client
        .query_opt(
            "SELECT id, user_id, session_id, filename, content_type, bytes, created_at
             FROM uploads WHERE user_id = $1 AND session_id = $2",
            &[&user_id, &session_id],
        )
        .await
        .map_err(StoriaError::storage)?;

    let Some(row) = row else {
        return Ok(None);
    };
    Ok(Some(Upload {
        id: row.try_get("id").map_err(StoriaError::storage)?,
        user_id: row.try_get("user_id").map_err(StoriaError::storage)?,
        session_id: row.try_get("session_id").map_err(StoriaError::storage)?,
        filename: row.try_get("filename").map_err(StoriaError::storage)?,
        content_type: row.try_get("content_type").map_err(StoriaError::storage)?,
        bytes: row.try_get("bytes").map_err(StoriaError::storage)?,
        created_at: row.try_get("created_at").map_err(StoriaError::storage)?,
    }))
}
