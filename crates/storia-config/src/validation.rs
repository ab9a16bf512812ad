// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::StoriaConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &StoriaConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let host = config.server.host.trim();
    if host.is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    } else if host.parse::<std::net::IpAddr>().is_err()
        && !host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        errors.push(ConfigError::validation(format!(
            "server.host `{host}` is not a valid IP address or hostname"
        )));
    }

    if config.server.port == 0 {
        errors.push(ConfigError::validation("server.port must not be 0"));
    }

    if !LOG_LEVELS.contains(&config.server.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::validation(format!(
            "server.log_level `{}` must be one of: {}",
            config.server.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.database.pool_size == 0 {
        errors.push(ConfigError::validation(
            "database.pool_size must be greater than 0",
        ));
    }

    if let Some(url) = &config.database.url
        && url.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "database.url must not be empty when set",
        ));
    }

    let temperature = config.gemini.temperature;
    if !(0.0..=2.0).contains(&temperature) {
        errors.push(ConfigError::validation(format!(
            "gemini.temperature must be between 0.0 and 2.0, got {temperature}"
        )));
    }

    if config.gemini.model.trim().is_empty() {
        errors.push(ConfigError::validation("gemini.model must not be empty"));
    }

    if config.auth.token_ttl_secs == 0 {
        errors.push(ConfigError::validation(
            "auth.token_ttl_secs must be greater than 0",
        ));
    }

    if let Some(secret) = &config.auth.jwt_secret
        && secret.is_empty()
    {
        errors.push(ConfigError::validation(
            "auth.jwt_secret must not be empty when set",
        ));
    }

    if config.auth.cookie_name.trim().is_empty() {
        errors.push(ConfigError::validation("auth.cookie_name must not be empty"));
    }

    if config.chat.max_upload_bytes == 0 {
        errors.push(ConfigError::validation(
            "chat.max_upload_bytes must be greater than 0",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
