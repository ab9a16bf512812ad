// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! PostgreSQL implementation of the store traits.

use async_trait::async_trait;
use tracing::debug;

use storia_config::DatabaseConfig;
use storia_core::types::{Message, NewMessage, NewUpload, NewUser, Upload, User};
use storia_core::{
    AdapterType, HealthStatus, PluginAdapter, SessionStore, StoriaError, UserStore,
};

use crate::database::Database;
use crate::{queries, schema};

/// PostgreSQL-backed store for sessions and users.
///
/// Every call checks a connection out of the shared pool, so one instance
/// serves all connections concurrently.
#[derive(Clone)]
pub struct PostgresStorage {
    db: Database,
}

impl PostgresStorage {
    /// Create the pool. Nothing is opened until the first query.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, StoriaError> {
        Ok(Self {
            db: Database::connect(config)?,
        })
    }

    pub fn from_database(db: Database) -> Self {
        Self { db }
    }

    /// Apply the schema bootstrap.
    pub async fn initialize(&self) -> Result<(), StoriaError> {
        schema::apply(&self.db).await
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl PluginAdapter for PostgresStorage {
    fn name(&self) -> &str {
        "postgres"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, StoriaError> {
        let client = match self.db.client().await {
            Ok(client) => client,
            Err(e) => return Ok(HealthStatus::Unhealthy(e.to_string())),
        };
        match client.simple_query("SELECT 1").await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), StoriaError> {
        self.db.pool().close();
        debug!("database pool closed");
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PostgresStorage {
    async fn find_upload(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Option<Upload>, StoriaError> {
        queries::uploads::find_upload(&self.db, user_id, session_id).await
    }

    async fn save_upload(&self, upload: &NewUpload) -> Result<i64, StoriaError> {
        queries::uploads::insert_upload(&self.db, upload).await
    }

    async fn save_message(&self, message: &NewMessage) -> Result<Message, StoriaError> {
        queries::messages::insert_message(&self.db, message).await
    }

    async fn list_messages(
        &self,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<Message>, StoriaError> {
        queries::messages::list_for_session(&self.db, user_id, session_id).await
    }

    async fn list_session_ids(&self, user_id: &str) -> Result<Vec<String>, StoriaError> {
        queries::messages::list_session_ids(&self.db, user_id).await
    }
}

#[async_trait]
impl UserStore for PostgresStorage {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoriaError> {
        queries::users::find_by_email(&self.db, email).await
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, StoriaError> {
        queries::users::insert_user(&self.db, user).await
    }
}
