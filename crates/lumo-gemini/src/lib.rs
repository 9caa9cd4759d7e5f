// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider adapter for Lumo.
//!
//! Implements [`ProviderAdapter`] on top of the `generateContent` REST
//! endpoint. API key resolution: `gemini.api_key` from config, then the
//! `GEMINI_API_KEY` environment variable.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use lumo_config::model::GeminiConfig;
use lumo_core::error::LumoError;
use lumo_core::traits::{PluginAdapter, ProviderAdapter};
use lumo_core::types::{
    AdapterType, ChatRole, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, GenerationConfigBody};

/// Gemini provider implementing [`ProviderAdapter`].
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    /// Creates a provider from the `[gemini]` config section.
    pub fn new(config: &GeminiConfig) -> Result<Self, LumoError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(
            &api_key,
            config.model.clone(),
            &config.base_url,
            Duration::from_secs(config.timeout_secs),
        )?;

        info!(model = %config.model, "Gemini provider initialized");
        Ok(Self { client })
    }

    /// Creates a provider around an existing client.
    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

/// Converts a [`ProviderRequest`] into the Gemini wire format.
pub fn to_generate_request(request: &ProviderRequest) -> GenerateContentRequest {
    let contents = request
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            Content::text(Some(role), m.content.clone())
        })
        .collect();

    GenerateContentRequest {
        contents,
        system_instruction: request
            .system_prompt
            .as_ref()
            .map(|prompt| Content::text(None, prompt.clone())),
        generation_config: GenerationConfigBody {
            temperature: request.generation.temperature,
            top_k: request.generation.top_k,
            top_p: request.generation.top_p,
            max_output_tokens: request.generation.max_output_tokens,
        },
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LumoError> {
        // No API call: health checks should not spend quota.
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LumoError> {
        debug!("Gemini provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, LumoError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.client.default_model().to_string());
        let api_request = to_generate_request(&request);
        let response = self.client.generate_content(&model, &api_request).await?;

        let Some(content) = response.text() else {
            let reason = response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone())
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(LumoError::Provider {
                message: format!("Gemini returned no content: {reason}"),
                source: None,
            });
        };

        let usage = response.usage_metadata.clone().unwrap_or_default();
        Ok(ProviderResponse {
            id: response.response_id.clone().unwrap_or_default(),
            content,
            model: response.model_version.clone().unwrap_or(model),
            finish_reason: response
                .candidates
                .first()
                .and_then(|c| c.finish_reason.clone()),
            usage: TokenUsage {
                input_tokens: usage.prompt_token_count,
                output_tokens: usage.candidates_token_count,
            },
        })
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, LumoError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("GEMINI_API_KEY").map_err(|_| {
        LumoError::Config(
            "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
        )
    })
}
