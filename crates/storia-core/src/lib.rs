// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Storia.
//!
//! Holds the error type, the domain types and the adapter traits every other
//! crate in the workspace builds on.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, StoriaError};
pub use types::{AdapterType, HealthStatus, PersistenceMode, Role};

pub use traits::{
    ChatSession, GenerativeBackend, PluginAdapter, SessionStore, TurnTransport, UserStore,
};
