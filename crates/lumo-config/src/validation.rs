// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::LumoConfig;

/// Validate a deserialized configuration.
///
/// Collects every violation instead of stopping at the first one.
pub fn validate_config(config: &LumoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if !matches!(
        config.app.log_level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::validation(format!(
            "app.log_level must be one of trace, debug, info, warn, error; got `{}`",
            config.app.log_level
        )));
    }

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

    if config.server.user_header.trim().is_empty() {
        errors.push(ConfigError::validation("server.user_header must not be empty"));
    }

    if let Some(token) = &config.server.bearer_token
        && token.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "server.bearer_token must not be empty when set; remove it to disable auth",
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation("storage.database_path must not be empty"));
    }

    let gemini = &config.gemini;
    if gemini.model.trim().is_empty() {
        errors.push(ConfigError::validation("gemini.model must not be empty"));
    }
    for (key, value) in [
        ("gemini.temperature", gemini.temperature),
        ("gemini.evaluation_temperature", gemini.evaluation_temperature),
    ] {
        if !(0.0..=2.0).contains(&value) {
            errors.push(ConfigError::validation(format!(
                "{key} must be between 0.0 and 2.0, got {value}"
            )));
        }
    }
    if !(gemini.top_p > 0.0 && gemini.top_p <= 1.0) {
        errors.push(ConfigError::validation(format!(
            "gemini.top_p must be in (0.0, 1.0], got {}",
            gemini.top_p
        )));
    }
    for (key, value) in [
        ("gemini.top_k", gemini.top_k),
        ("gemini.max_output_tokens", gemini.max_output_tokens),
        (
            "gemini.evaluation_max_output_tokens",
            gemini.evaluation_max_output_tokens,
        ),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!("{key} must be at least 1")));
        }
    }
    if gemini.timeout_secs == 0 {
        errors.push(ConfigError::validation("gemini.timeout_secs must be at least 1"));
    }

    let evaluation = &config.evaluation;
    for (key, value) in [
        ("evaluation.min_questions", evaluation.min_questions),
        ("evaluation.min_responses", evaluation.min_responses),
        ("evaluation.min_messages", evaluation.min_messages),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!("{key} must be at least 1")));
        }
    }
    if evaluation.termination_sentinel.trim().is_empty() {
        errors.push(ConfigError::validation(
            "evaluation.termination_sentinel must not be empty",
        ));
    }

    if config.session.default_time_allowed_secs <= 0 {
        errors.push(ConfigError::validation(format!(
            "session.default_time_allowed_secs must be positive, got {}",
            config.session.default_time_allowed_secs
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&LumoConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let mut config = LumoConfig::default();
        config.server.host = " ".into();
        config.evaluation.min_questions = 0;
        config.gemini.top_p = 1.5;
        config.session.default_time_allowed_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn rejects_unknown_log_level() {
        let mut config = LumoConfig::default();
        config.app.log_level = "verbose".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("app.log_level"));
    }

    #[test]
    fn zero_threshold_from_toml_is_rejected() {
        let config: LumoConfig =
            toml::from_str("[evaluation]\nmin_responses = 0\nmin_questions = 3\n").unwrap();
        assert_eq!(config.evaluation.min_questions, 3);

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("evaluation.min_responses"));
    }

    #[test]
    fn rejects_blank_bearer_token() {
        let mut config = LumoConfig::default();
        config.server.bearer_token = Some(String::new());
        assert!(validate_config(&config).is_err());
    }
}
