// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs.
//!
//! All structs use `#[serde(deny_unknown_fields)]` so a misspelled key is
//! reported at startup instead of being silently ignored.

use serde::{Deserialize, Serialize};

/// Top-level Lumo configuration. Every section is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LumoConfig {
    #[serde(default)]
    pub app: AppConfig,

    /// HTTP gateway settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Eligibility thresholds for evaluation.
    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

/// Process-wide settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP gateway configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token required on `/v1` routes. `None` disables token auth.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Header carrying the authenticated user id, set by the upstream auth layer.
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bearer_token: None,
            user_header: default_user_header(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_user_header() -> String {
    "x-lumo-user".to_string()
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to the `GEMINI_API_KEY` environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // Interviewer chat sampling.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    // Rubric generation sampling.
    #[serde(default = "default_evaluation_temperature")]
    pub evaluation_temperature: f32,

    #[serde(default = "default_evaluation_max_output_tokens")]
    pub evaluation_max_output_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            evaluation_temperature: default_evaluation_temperature(),
            evaluation_max_output_tokens: default_evaluation_max_output_tokens(),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_evaluation_temperature() -> f32 {
    0.3
}

fn default_evaluation_max_output_tokens() -> u32 {
    2048
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL journal mode.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("lumo").join("lumo.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("lumo.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Thresholds gating evaluation of a session.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    /// Interviewer questions required, not counting the closing message.
    #[serde(default = "default_min_questions")]
    pub min_questions: usize,

    /// Candidate answers required.
    #[serde(default = "default_min_responses")]
    pub min_responses: usize,

    /// Total messages required before the LLM is called at all.
    #[serde(default = "default_min_messages")]
    pub min_messages: usize,

    /// Phrase marking the interviewer's closing message (matched case-insensitively).
    #[serde(default = "default_termination_sentinel")]
    pub termination_sentinel: String,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            min_questions: default_min_questions(),
            min_responses: default_min_responses(),
            min_messages: default_min_messages(),
            termination_sentinel: default_termination_sentinel(),
        }
    }
}

fn default_min_questions() -> usize {
    7
}

fn default_min_responses() -> usize {
    6
}

fn default_min_messages() -> usize {
    5
}

fn default_termination_sentinel() -> String {
    "You have completed the interview questions".to_string()
}

/// Session defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Time budget for new sessions, in seconds.
    #[serde(default = "default_time_allowed_secs")]
    pub default_time_allowed_secs: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_time_allowed_secs: default_time_allowed_secs(),
        }
    }
}

fn default_time_allowed_secs() -> i64 {
    900
}
