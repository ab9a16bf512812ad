// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat-session continuity for Storia.
//!
//! - [`HistoryLoader`] rebuilds a session's conversation from storage.
//! - [`TurnRelay`] drives one live connection: seed a chat session with the
//!   loaded history, then dispatch, persist and reply to each inbound turn.
//! - [`StoryService`] turns an uploaded file into the opening story of a session.

pub mod frame;
pub mod history;
pub mod relay;
pub mod story;

pub use history::HistoryLoader;
pub use relay::{RelayExit, RelayOptions, RelayState, TurnRelay};
pub use story::StoryService;
