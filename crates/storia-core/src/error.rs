// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by every Storia crate.

use strum::{Display, EnumString};
use thiserror::Error;

/// Closed classification of [`StoriaError`] values.
///
/// Callers that need to react to an error (HTTP status mapping, login
/// outcomes) match on the kind instead of inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// The requested entity does not exist.
    NotFound,
    /// The caller is not who they claim to be, or lacks a valid credential.
    Unauthorized,
    /// The request itself is malformed or violates a constraint.
    InvalidInput,
    /// Anything else: storage, backend, transport, configuration.
    Internal,
}

/// The primary error type used across Storia adapter traits and services.
#[derive(Debug, Error)]
pub enum StoriaError {
    /// Configuration errors (missing secrets, invalid values).
    #[error("configuration error: {0}")]
    Config(String),

    /// A looked-up entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller-supplied input was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Storage backend errors (connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generative backend errors (HTTP failure, unsupported response shape).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Connection-level errors (socket read or write).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl StoriaError {
    /// Classifies this error into its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoriaError::NotFound(_) => ErrorKind::NotFound,
            StoriaError::Unauthorized(_) => ErrorKind::Unauthorized,
            StoriaError::InvalidInput(_) => ErrorKind::InvalidInput,
            StoriaError::Config(_)
            | StoriaError::Storage { .. }
            | StoriaError::Backend { .. }
            | StoriaError::Transport { .. }
            | StoriaError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Wraps any error as a storage failure.
    pub fn storage(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StoriaError::Storage {
            source: Box::new(err),
        }
    }

    /// Backend failure without an underlying cause.
    pub fn backend(message: impl Into<String>) -> Self {
        StoriaError::Backend {
            message: message.into(),
            source: None,
        }
    }

    /// Transport failure without an underlying cause.
    pub fn transport(message: impl Into<String>) -> Self {
        StoriaError::Transport {
            message: message.into(),
            source: None,
        }
    }
}
