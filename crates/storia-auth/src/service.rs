// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User registration, lookup and login.

use std::sync::Arc;

use tracing::{debug, info};

use storia_core::types::{NewUser, User};
use storia_core::{StoriaError, UserStore};

use crate::password::{hash_password, verify_password};
use crate::token::JwtService;

/// Account operations over a [`UserStore`].
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    tokens: Arc<JwtService>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, tokens: Arc<JwtService>) -> Self {
        Self { store, tokens }
    }

    pub fn tokens(&self) -> &JwtService {
        &self.tokens
    }

    /// Create an account. Name, email and password must be non-empty and
    /// the email must not be registered yet.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, StoriaError> {
        let name = name.trim();
        let email = email.trim();
        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(StoriaError::InvalidInput(
                "name, email and password are required".into(),
            ));
        }
        if !email.contains('@') {
            return Err(StoriaError::InvalidInput(format!(
                "`{email}` is not an email address"
            )));
        }

        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| StoriaError::Internal(format!("hashing task failed: {e}")))??;

        let user = self
            .store
            .insert_user(&NewUser {
                id: uuid::Uuid::new_v4().to_string(),
                name: name.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Look an account up by email. Absent accounts are `NotFound`.
    pub async fn get_by_email(&self, email: &str) -> Result<User, StoriaError> {
        self.store
            .find_user_by_email(email)
            .await?
            .ok_or_else(|| StoriaError::NotFound(format!("user {email}")))
    }

    /// Check credentials and issue a session token.
    ///
    /// Unknown email is `NotFound`, wrong password is `Unauthorized`.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<String, StoriaError> {
        let user = self.get_by_email(email).await?;

        let password = password.to_string();
        let stored = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || verify_password(&password, &stored))
            .await
            .map_err(|e| StoriaError::Internal(format!("verification task failed: {e}")))??;
        if !valid {
            debug!(user_id = %user.id, "login rejected: wrong password");
            return Err(StoriaError::Unauthorized("invalid credentials".into()));
        }

        let token = self.tokens.issue(&user.id, &user.email)?;
        info!(user_id = %user.id, "user authenticated");
        Ok(token)
    }
}
