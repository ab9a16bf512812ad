// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across adapter traits and services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::StoriaError;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`PluginAdapter`](crate::PluginAdapter).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Storage,
    Generative,
    Transport,
}

/// Who authored a turn.
///
/// Stored canonically as `"user"` / `"model"`. The legacy spellings
/// `"client"` and `"ai"` are accepted on input.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum Role {
    #[strum(to_string = "user", serialize = "client")]
    #[serde(alias = "client")]
    User,
    #[strum(to_string = "model", serialize = "ai")]
    #[serde(alias = "ai")]
    Model,
}

impl Role {
    /// Canonical storage spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// A persisted conversational turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user_id: String,
    pub session_id: String,
    pub sender: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// A turn about to be persisted. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub user_id: String,
    pub session_id: String,
    pub sender: Role,
    pub content: String,
}

impl NewMessage {
    pub fn new(
        user_id: impl Into<String>,
        session_id: impl Into<String>,
        sender: Role,
        content: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
            sender,
            content: content.into(),
        }
    }
}

/// The single media artifact attached to a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub id: i64,
    pub user_id: String,
    pub session_id: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

/// An upload about to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUpload {
    pub user_id: String,
    pub session_id: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// A registered account. The password hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}

/// An account about to be inserted, with its password already hashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// A caller identity established by token verification at the HTTP edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

/// One piece of a conversation turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnPart {
    Text(String),
    Media { mime_type: String, data: Vec<u8> },
}

/// One turn in a conversation context handed to the generative backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextTurn {
    pub role: Role,
    pub parts: Vec<TurnPart>,
}

impl ContextTurn {
    /// A single-part text turn.
    pub fn text(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            parts: vec![TurnPart::Text(text.into())],
        }
    }

    /// A single-part media turn.
    pub fn media(role: Role, mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            role,
            parts: vec![TurnPart::Media {
                mime_type: mime_type.into(),
                data,
            }],
        }
    }
}

/// A decoded part of a generative response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePart {
    Text(String),
    Media { mime_type: String, data: Vec<u8> },
    /// A part shape this service does not consume (function calls, code, ...).
    /// Carries the wire field name for diagnostics.
    Other(String),
}

/// One candidate completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Candidate {
    pub parts: Vec<ResponsePart>,
}

/// A generative backend response.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateResponse {
    pub candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// A response with one candidate holding one text part.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            candidates: vec![Candidate {
                parts: vec![ResponsePart::Text(text.into())],
            }],
        }
    }

    /// Returns the text of the first candidate's first part.
    ///
    /// Only that part is consulted. Missing candidates, missing parts and
    /// non-text parts are all backend failures.
    pub fn first_text(&self) -> Result<&str, StoriaError> {
        let part = self
            .candidates
            .first()
            .and_then(|c| c.parts.first())
            .ok_or_else(|| StoriaError::backend("not found response text: empty response"))?;
        match part {
            ResponsePart::Text(text) => Ok(text),
            ResponsePart::Media { mime_type, .. } => Err(StoriaError::backend(format!(
                "not found response text: first part is {mime_type} media"
            ))),
            ResponsePart::Other(kind) => Err(StoriaError::backend(format!(
                "not found response text: first part is {kind}"
            ))),
        }
    }
}

/// What the relay does when a turn cannot be persisted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersistenceMode {
    /// Log the failure and still deliver the reply.
    #[default]
    BestEffort,
    /// Abort the turn and close the connection without replying.
    Strict,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_parses_aliases() {
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("client").unwrap(), Role::User);
        assert_eq!(Role::from_str("model").unwrap(), Role::Model);
        assert_eq!(Role::from_str("ai").unwrap(), Role::Model);
        assert_eq!(Role::from_str("MODEL").unwrap(), Role::Model);
        assert!(Role::from_str("system").is_err());
    }

    #[test]
    fn role_displays_canonical_spelling() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Model.to_string(), "model");
        assert_eq!(Role::Model.as_str(), "model");
    }

    #[test]
    fn role_serde_accepts_aliases() {
        let role: Role = serde_json::from_str("\"ai\"").unwrap();
        assert_eq!(role, Role::Model);
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn first_text_reads_first_candidate_first_part() {
        let resp = GenerateResponse {
            candidates: vec![
                Candidate {
                    parts: vec![
                        ResponsePart::Text("once upon a time".into()),
                        ResponsePart::Other("functionCall".into()),
                    ],
                },
                Candidate {
                    parts: vec![ResponsePart::Text("ignored".into())],
                },
            ],
        };
        assert_eq!(resp.first_text().unwrap(), "once upon a time");
    }

    #[test]
    fn first_text_rejects_empty_and_non_text() {
        let empty = GenerateResponse::default();
        let err = empty.first_text().unwrap_err();
        assert!(err.to_string().contains("not found response text"));

        let no_parts = GenerateResponse {
            candidates: vec![Candidate::default()],
        };
        assert!(no_parts.first_text().is_err());

        let media = GenerateResponse {
            candidates: vec![Candidate {
                parts: vec![ResponsePart::Media {
                    mime_type: "image/png".into(),
                    data: vec![1, 2, 3],
                }],
            }],
        };
        let err = media.first_text().unwrap_err();
        assert!(err.to_string().contains("image/png"), "got: {err}");
    }

    #[test]
    fn persistence_mode_round_trips_through_serde() {
        let mode: PersistenceMode = serde_json::from_str("\"strict\"").unwrap();
        assert_eq!(mode, PersistenceMode::Strict);
        assert_eq!(PersistenceMode::default(), PersistenceMode::BestEffort);
        assert_eq!(PersistenceMode::BestEffort.to_string(), "best_effort");
    }

    #[test]
    fn user_serialization_omits_password_hash() {
        let user = User {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("ada@example.com"));
    }
}
