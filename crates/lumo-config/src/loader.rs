// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Merge order (later overrides earlier): compiled defaults,
//! `/etc/lumo/lumo.toml`, `~/.config/lumo/lumo.toml`, `./lumo.toml`,
//! then `LUMO_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::LumoConfig;

/// Top-level sections an environment variable may address.
const SECTIONS: &[&str] = &["app", "server", "gemini", "storage", "evaluation", "session"];

pub(crate) const SYSTEM_CONFIG_PATH: &str = "/etc/lumo/lumo.toml";
pub(crate) const LOCAL_CONFIG_PATH: &str = "lumo.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("lumo/lumo.toml"))
        .unwrap_or_default()
}

/// Load configuration from the standard hierarchy with env var overrides.
pub fn load_config() -> Result<LumoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string on top of the defaults.
///
/// Environment variables are not consulted.
pub fn load_config_from_str(toml_content: &str) -> Result<LumoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LumoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<LumoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(LumoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The Figment used by [`load_config`], before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(LumoConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// Map a lowercased, prefix-stripped env var name to a dotted config key.
///
/// Only the leading section is split off, so `gemini_evaluation_temperature`
/// becomes `gemini.evaluation_temperature`.
pub fn env_key_to_path(key: &str) -> String {
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
            && !field.is_empty()
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}

fn env_provider() -> Env {
    Env::prefixed("LUMO_")
        .map(|key| env_key_to_path(&key.as_str().to_ascii_lowercase()).into())
}
