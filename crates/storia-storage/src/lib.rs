// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PostgreSQL persistence layer for Storia.
//!
//! A `deadpool-postgres` pool shared by every connection, an idempotent
//! schema bootstrap, and typed queries for users, messages and uploads.

pub mod adapter;
pub mod database;
pub mod queries;
pub mod schema;

pub use adapter::PostgresStorage;
pub use database::Database;
