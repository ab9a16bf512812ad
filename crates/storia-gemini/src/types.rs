// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini `generateContent` request/response types.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use storia_core::Role;
use storia_core::types::{
    Candidate as CoreCandidate, ContextTurn, GenerateResponse, ResponsePart, TurnPart,
};

// --- Request types ---

/// Body of a `models/{model}:generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationConfig {
    pub temperature: f32,
}

/// One conversation turn on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

/// A request part. Exactly one field is set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
}

/// Inline binary data, base64 encoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    pub fn inline(mime_type: impl Into<String>, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(Blob {
                mime_type: mime_type.into(),
                data: STANDARD.encode(data),
            }),
        }
    }
}

/// A response part as received.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePart {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub inline_data: Option<Blob>,
    /// Part shapes this service does not consume (function calls, code, ...).
    #[serde(flatten)]
    pub other: BTreeMap<String, serde_json::Value>,
}

impl WirePart {
    /// Decode a wire part into the closed [`ResponsePart`] set.
    ///
    /// `text` wins over `inlineData`. Undecodable base64 and unknown shapes
    /// become [`ResponsePart::Other`] carrying the field name.
    pub fn decode(self) -> ResponsePart {
        if let Some(text) = self.text {
            return ResponsePart::Text(text);
        }
        if let Some(blob) = self.inline_data {
            return match STANDARD.decode(blob.data.as_bytes()) {
                Ok(data) => ResponsePart::Media {
                    mime_type: blob.mime_type,
                    data,
                },
                Err(_) => ResponsePart::Other("inlineData".to_string()),
            };
        }
        let kind = self
            .other
            .into_keys()
            .find(|k| k != "thought" && k != "thoughtSignature")
            .unwrap_or_else(|| "empty part".to_string());
        ResponsePart::Other(kind)
    }
}

impl From<&ContextTurn> for Content {
    fn from(turn: &ContextTurn) -> Self {
        Content {
            role: turn.role.as_str().to_string(),
            parts: turn
                .parts
                .iter()
                .map(|part| match part {
                    TurnPart::Text(text) => Part::text(text.clone()),
                    TurnPart::Media { mime_type, data } => Part::inline(mime_type.clone(), data),
                })
                .collect(),
        }
    }
}

// --- Response types ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<WirePart>,
}

impl From<GenerateContentResponse> for GenerateResponse {
    fn from(response: GenerateContentResponse) -> Self {
        GenerateResponse {
            candidates: response
                .candidates
                .into_iter()
                .map(|candidate| CoreCandidate {
                    parts: candidate
                        .content
                        .map(|c| c.parts.into_iter().map(WirePart::decode).collect())
                        .unwrap_or_default(),
                })
                .collect(),
        }
    }
}

/// Turns the first candidate into a model turn for chat history.
///
/// Parts the history cannot carry are dropped.
pub fn model_turn(response: &GenerateResponse) -> Option<ContextTurn> {
    let candidate = response.candidates.first()?;
    let parts = candidate
        .parts
        .iter()
        .filter_map(|part| match part {
            ResponsePart::Text(text) => Some(TurnPart::Text(text.clone())),
            ResponsePart::Media { mime_type, data } => Some(TurnPart::Media {
                mime_type: mime_type.clone(),
                data: data.clone(),
            }),
            ResponsePart::Other(_) => None,
        })
        .collect();
    Some(ContextTurn {
        role: Role::Model,
        parts,
    })
}

// --- Error types ---

/// Google API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: u16,
    pub message: String,
    #[serde(default)]
    pub status: String,
}
