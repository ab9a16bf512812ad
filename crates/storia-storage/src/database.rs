// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection pool construction and error mapping.

use std::time::Duration;

use deadpool_postgres::{
    Config, ManagerConfig, Object, Pool, PoolConfig, RecyclingMethod, Runtime,
};
use tokio_postgres::NoTls;
use tokio_postgres::error::SqlState;
use tracing::debug;

use storia_config::DatabaseConfig;
use storia_core::StoriaError;

/// Shared handle to the connection pool. Cheap to clone.
#[derive(Clone)]
pub struct Database {
    pool: Pool,
}

impl Database {
    /// Build a pool from configuration.
    ///
    /// No connection is opened until the first query.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, StoriaError> {
        let pool = pool_config(config)
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoriaError::Config(format!("invalid database configuration: {e}")))?;
        debug!(
            pool_size = config.pool_size,
            from_url = config.url.is_some(),
            "database pool created"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// Check a connection out of the pool.
    pub async fn client(&self) -> Result<Object, StoriaError> {
        self.pool.get().await.map_err(StoriaError::storage)
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}

pub(crate) fn pool_config(config: &DatabaseConfig) -> Config {
    let mut cfg = Config::new();
    match &config.url {
        Some(url) => cfg.url = Some(url.clone()),
        None => {
            cfg.host = Some(config.host.clone());
            cfg.port = Some(config.port);
            cfg.user = Some(config.user.clone());
            cfg.password = config.password.clone();
            cfg.dbname = Some(config.dbname.clone());
        }
    }
    let timeout = Duration::from_secs(config.connect_timeout_secs);
    cfg.connect_timeout = Some(timeout);
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });
    let mut pool = PoolConfig::new(config.pool_size);
    pool.timeouts.wait = Some(timeout);
    pool.timeouts.create = Some(timeout);
    cfg.pool = Some(pool);
    cfg
}

/// Map a driver error, turning unique-constraint violations into
/// [`StoriaError::InvalidInput`] with `conflict` as the message.
pub(crate) fn map_pg_err(err: tokio_postgres::Error, conflict: &str) -> StoriaError {
    if err.code() == Some(&SqlState::UNIQUE_VIOLATION) {
        return StoriaError::InvalidInput(conflict.to_string());
    }
    StoriaError::storage(err)
}
