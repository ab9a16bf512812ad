// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini generative backend for Storia.
//!
//! Implements [`GenerativeBackend`] over the `generateContent` REST endpoint.
//! Chat sessions keep their history client-side and resend it with every turn.

pub mod client;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::SecretString;
use tracing::{debug, info};

use storia_config::GeminiConfig;
use storia_core::error::StoriaError;
use storia_core::traits::{ChatSession, GenerativeBackend, PluginAdapter};
use storia_core::types::{AdapterType, ContextTurn, GenerateResponse, HealthStatus};
use storia_core::Role;

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfig, model_turn};

/// Gemini backend shared by every connection.
pub struct GeminiBackend {
    client: Arc<GeminiClient>,
    temperature: f32,
}

impl GeminiBackend {
    /// Creates the backend from configuration.
    ///
    /// # API Key Resolution
    /// 1. `gemini.api_key` if set and non-empty
    /// 2. `GEMINI_API_KEY` environment variable
    /// 3. Returns error if neither is available
    pub fn new(config: &GeminiConfig) -> Result<Self, StoriaError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(api_key, config)?;
        info!(model = %config.model, "Gemini backend initialized");
        Ok(Self::with_client(client, config.temperature))
    }

    pub fn with_client(client: GeminiClient, temperature: f32) -> Self {
        Self {
            client: Arc::new(client),
            temperature,
        }
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<SecretString, StoriaError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(SecretString::from(key.clone()));
    }

    std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .map(SecretString::from)
        .ok_or_else(|| {
            StoriaError::Config(
                "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
            )
        })
}

async fn dispatch(
    client: &GeminiClient,
    temperature: f32,
    turns: &[ContextTurn],
) -> Result<GenerateResponse, StoriaError> {
    let request = GenerateContentRequest {
        contents: turns.iter().map(Content::from).collect(),
        generation_config: GenerationConfig { temperature },
    };
    let response = client.generate_content(&request).await?;
    let response = GenerateResponse::from(response);
    debug!(
        turns = turns.len(),
        candidates = response.candidates.len(),
        "generateContent completed"
    );
    Ok(response)
}

#[async_trait]
impl PluginAdapter for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generative
    }

    async fn health_check(&self) -> Result<HealthStatus, StoriaError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), StoriaError> {
        Ok(())
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    fn start_chat(&self, history: Vec<ContextTurn>) -> Box<dyn ChatSession> {
        Box::new(GeminiChat {
            client: Arc::clone(&self.client),
            temperature: self.temperature,
            history,
        })
    }

    async fn generate(&self, turns: Vec<ContextTurn>) -> Result<GenerateResponse, StoriaError> {
        dispatch(&self.client, self.temperature, &turns).await
    }
}

/// A conversation with Gemini. Owns its history.
pub struct GeminiChat {
    client: Arc<GeminiClient>,
    temperature: f32,
    history: Vec<ContextTurn>,
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send_turn(&mut self, text: &str) -> Result<GenerateResponse, StoriaError> {
        let user_turn = ContextTurn::text(Role::User, text);
        let mut turns = self.history.clone();
        turns.push(user_turn.clone());

        let response = dispatch(&self.client, self.temperature, &turns).await?;

        self.history.push(user_turn);
        if let Some(model) = model_turn(&response) {
            self.history.push(model);
        }
        Ok(response)
    }

    fn history(&self) -> &[ContextTurn] {
        &self.history
    }
}
