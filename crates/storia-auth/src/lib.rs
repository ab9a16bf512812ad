// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Accounts and credentials for Storia.
//!
//! Argon2 password hashing, HS256 session tokens, and the user service that
//! registers, looks up and authenticates accounts over a [`UserStore`].
//!
//! [`UserStore`]: storia_core::UserStore

pub mod password;
pub mod service;
pub mod token;

pub use service::UserService;
pub use token::{Claims, JwtService};
