// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON frames the relay sends besides plain reply text.

use serde::Serialize;

use storia_core::Role;
use storia_core::types::{ContextTurn, TurnPart};

/// First frame of a connection: the conversation so far.
///
/// Media is summarized by type and size; the bytes stay on the server.
#[derive(Debug, Serialize)]
pub struct HistoryFrame<'a> {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub turns: Vec<FrameTurn<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FrameTurn<'a> {
    pub role: Role,
    pub parts: Vec<FramePart<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FramePart<'a> {
    Text { text: &'a str },
    Media { mime_type: &'a str, size: usize },
}

impl<'a> HistoryFrame<'a> {
    pub fn new(turns: &'a [ContextTurn]) -> Self {
        Self {
            kind: "history",
            turns: turns
                .iter()
                .map(|turn| FrameTurn {
                    role: turn.role,
                    parts: turn
                        .parts
                        .iter()
                        .map(|part| match part {
                            TurnPart::Text(text) => FramePart::Text { text },
                            TurnPart::Media { mime_type, data } => FramePart::Media {
                                mime_type,
                                size: data.len(),
                            },
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Error frame sent when a connection cannot be set up.
#[derive(Debug, Serialize)]
pub struct ErrorFrame<'a> {
    pub error: &'a str,
}
