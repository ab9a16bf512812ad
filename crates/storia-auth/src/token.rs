// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HS256 session tokens.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use storia_config::AuthConfig;
use storia_core::StoriaError;
use storia_core::types::Identity;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    pub iat: i64,
    pub exp: i64,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Identity {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtService {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Build from `[auth]`. Fails when no secret is configured.
    pub fn from_config(config: &AuthConfig) -> Result<Self, StoriaError> {
        match config.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => Ok(Self::new(secret, config.token_ttl_secs)),
            _ => Err(StoriaError::Config(
                "auth.jwt_secret is required (set it in storia.toml or STORIA_AUTH_JWT_SECRET)"
                    .into(),
            )),
        }
    }

    /// Issue a token for the given user.
    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, StoriaError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| StoriaError::Internal(format!("jwt encode error: {e}")))
    }

    /// Verify a token and return its claims. Any failure is `Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<Claims, StoriaError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| StoriaError::Unauthorized(format!("invalid token: {e}")))
    }
}
