// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP API and WebSocket story chat.
//!
//! The gateway is the only outer surface of Storia. It authenticates
//! requests, forwards account and upload operations to the services in
//! `storia-auth` and `storia-chat`, and runs one [`storia_chat::TurnRelay`]
//! per WebSocket connection.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod server;
pub mod ws;

pub use error::ApiError;
pub use server::{GatewayState, build_router, start_server};
