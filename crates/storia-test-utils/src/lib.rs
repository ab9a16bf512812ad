// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Storia integration tests.
//!
//! Provides in-memory and scripted adapters for fast, deterministic,
//! CI-runnable tests without PostgreSQL or the Gemini API.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory session and user store with write-failure injection
//! - [`MockBackend`] - Generative backend that replays scripted replies
//! - [`MockTransport`] - Turn transport with scripted inbound frames and captured output

pub mod mock_backend;
pub mod mock_store;
pub mod mock_transport;

pub use mock_backend::{MockBackend, ScriptedReply};
pub use mock_store::MemoryStore;
pub use mock_transport::{MockTransport, TransportHandle};
