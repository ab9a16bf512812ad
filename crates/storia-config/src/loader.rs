// SPDX-FileCopyrightText: 2026 Storia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./storia.toml` > `~/.config/storia/storia.toml` > `/etc/storia/storia.toml`
//! with environment variable overrides via `STORIA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::StoriaConfig;

/// Top-level sections that environment variables may address.
const SECTIONS: &[&str] = &["server", "database", "gemini", "auth", "chat"];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/storia/storia.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "storia.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("storia/storia.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/storia/storia.toml` (system-wide)
/// 3. `~/.config/storia/storia.toml` (user XDG config)
/// 4. `./storia.toml` (local directory)
/// 5. `STORIA_*` environment variables
pub fn load_config() -> Result<StoriaConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<StoriaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StoriaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<StoriaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(StoriaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(StoriaConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Environment provider mapping `STORIA_<SECTION>_<KEY>` to `<section>.<key>`.
///
/// Only the first underscore after the section name is a separator, so
/// `STORIA_AUTH_JWT_SECRET` lands on `auth.jwt_secret`. Variables outside the
/// known sections (`STORIA_USER_PASSWORD`, `STORIA_TEST_DATABASE_URL`) belong
/// to other tools and are skipped.
fn env_provider() -> Env {
    Env::prefixed("STORIA_")
        .filter(|key| map_env_key(key.as_str()).is_some())
        .map(|key| {
            map_env_key(key.as_str())
                .unwrap_or_else(|| key.as_str().to_owned())
                .into()
        })
}

fn map_env_key(key: &str) -> Option<String> {
    let key = key.to_ascii_lowercase();
    SECTIONS.iter().find_map(|section| {
        key.strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
            .map(|rest| format!("{section}.{rest}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_first_section_underscore() {
        assert_eq!(
            map_env_key("auth_jwt_secret").as_deref(),
            Some("auth.jwt_secret")
        );
        assert_eq!(
            map_env_key("GEMINI_API_KEY").as_deref(),
            Some("gemini.api_key")
        );
        assert_eq!(
            map_env_key("chat_send_history_on_connect").as_deref(),
            Some("chat.send_history_on_connect")
        );
        assert_eq!(map_env_key("database_url").as_deref(), Some("database.url"));
    }

    #[test]
    fn keys_outside_known_sections_are_ignored() {
        assert_eq!(map_env_key("user_password"), None);
        assert_eq!(map_env_key("test_database_url"), None);
        assert_eq!(map_env_key("serverless"), None);
    }
}
