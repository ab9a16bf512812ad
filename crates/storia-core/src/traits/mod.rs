// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Storage, generative backends and connection transports are reached only
//! through these traits, so services can be exercised against mocks.

pub mod adapter;
pub mod generative;
pub mod storage;
pub mod transport;

pub use adapter::PluginAdapter;
pub use generative::{ChatSession, GenerativeBackend};
pub use storage::{SessionStore, UserStore};
pub use transport::TurnTransport;
