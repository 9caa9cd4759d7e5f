// SPDX-FileCopyrightText: 2026 Lumo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted LLM provider for deterministic tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use lumo_core::traits::adapter::PluginAdapter;
use lumo_core::traits::provider::ProviderAdapter;
use lumo_core::types::{AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage};
use lumo_core::LumoError;

/// Text returned once the scripted queue runs dry.
pub const DEFAULT_RESPONSE: &str = "mock response";

/// One scripted reply.
#[derive(Debug, Clone)]
enum Scripted {
    Text(String),
    Failure(String),
}

/// A provider that pops pre-configured responses from a FIFO queue.
///
/// Every request is recorded so tests can assert on prompts. Queued failures
/// fail a single call; once told to fail via [`MockProvider::set_failure`],
/// every call returns a [`LumoError::Provider`].
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
    failure: Arc<Mutex<Option<String>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider pre-loaded with `responses`.
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            responses: Arc::new(Mutex::new(
                responses
                    .into_iter()
                    .map(|r| Scripted::Text(r.into()))
                    .collect(),
            )),
            ..Self::default()
        }
    }

    /// A provider whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Arc::new(Mutex::new(Some(message.into()))),
            ..Self::default()
        }
    }

    /// Append a response to the queue.
    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Scripted::Text(text.into()));
    }

    /// Queue a single failing call.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.responses
            .lock()
            .await
            .push_back(Scripted::Failure(message.into()));
    }

    /// Make subsequent calls fail (`Some`) or succeed again (`None`).
    pub async fn set_failure(&self, message: Option<String>) {
        *self.failure.lock().await = message;
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    async fn next_response(&self) -> Scripted {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Scripted::Text(DEFAULT_RESPONSE.to_string()))
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        "mock-provider"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, LumoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), LumoError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, LumoError> {
        let model = request.model.clone().unwrap_or_else(|| "mock-model".to_string());
        self.requests.lock().await.push(request);

        if let Some(message) = self.failure.lock().await.clone() {
            return Err(LumoError::Provider {
                message,
                source: None,
            });
        }

        let content = match self.next_response().await {
            Scripted::Text(text) => text,
            Scripted::Failure(message) => {
                return Err(LumoError::Provider {
                    message,
                    source: None,
                });
            }
        };

        Ok(ProviderResponse {
            id: format!("mock-resp-{}", uuid::Uuid::new_v4()),
            content,
            model,
            finish_reason: Some("STOP".to_string()),
            usage: TokenUsage {
                input_tokens: 10,
                output_tokens: 20,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use lumo_core::types::{GenerationConfig, ProviderMessage};

    use super::*;

    fn request(text: &str) -> ProviderRequest {
        ProviderRequest {
            model: None,
            system_prompt: None,
            messages: vec![ProviderMessage::user(text)],
            generation: GenerationConfig::default(),
        }
    }

    #[tokio::test]
    async fn queued_responses_returned_in_order() {
        let provider = MockProvider::with_responses(["first", "second"]);
        assert_eq!(provider.complete(request("a")).await.unwrap().content, "first");
        assert_eq!(provider.complete(request("b")).await.unwrap().content, "second");
        assert_eq!(
            provider.complete(request("c")).await.unwrap().content,
            DEFAULT_RESPONSE
        );
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let provider = MockProvider::new();
        provider.add_response("ok").await;
        provider.complete(request("hello")).await.unwrap();

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "hello");
    }

    #[tokio::test]
    async fn queued_failure_fails_one_call() {
        let provider = MockProvider::with_responses(["first"]);
        provider.add_failure("boom").await;
        provider.add_response("third").await;

        assert_eq!(provider.complete(request("a")).await.unwrap().content, "first");
        assert!(provider.complete(request("b")).await.is_err());
        assert_eq!(provider.complete(request("c")).await.unwrap().content, "third");
    }

    #[tokio::test]
    async fn failing_provider_errors_and_can_recover() {
        let provider = MockProvider::failing("quota exceeded");
        let err = provider.complete(request("x")).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));

        provider.set_failure(None).await;
        assert!(provider.complete(request("y")).await.is_ok());
        assert_eq!(provider.call_count().await, 2);
    }
}
