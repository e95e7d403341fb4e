// Mistral chat completion provider
//
// Mistral exposes an OpenAI-compatible `/v1/chat/completions` endpoint, so
// the request/response shapes here are the plain chat-completions ones.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::retry::{with_rate_limit_retry, RetryPolicy};
use super::types::{ChatMessage, ChatRequest, ChatResponse, ProviderError};
use super::LlmProvider;
use crate::config::constants::{DEFAULT_MAX_TOKENS, DEFAULT_MISTRAL_URL, DEFAULT_MODEL};
use crate::config::{ProviderConfig, RetryConfig};

const REQUEST_TIMEOUT_SECS: u64 = 60;
const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const PROVIDER_NAME: &str = "mistral";

#[derive(Clone)]
pub struct MistralProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl MistralProvider {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_MISTRAL_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            retry: RetryPolicy::default(),
        })
    }

    pub fn from_config(provider: &ProviderConfig, retry: &RetryConfig) -> Result<Self> {
        Ok(Self::new(provider.api_key.clone())?
            .with_model(provider.model.clone())
            .with_base_url(provider.base_url.clone())
            .with_max_tokens(provider.max_tokens)
            .with_retry_policy(RetryPolicy::from(retry)))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn to_request(&self, prompt: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)],
            max_tokens: Some(self.max_tokens),
        }
    }

    /// Send a single completion request (no retry)
    async fn complete_once(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = self.to_request(prompt);

        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Mistral API")?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::TOO_MANY_REQUESTS
                || body.to_lowercase().contains("rate limit exceeded")
            {
                return Err(ProviderError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                }
                .into());
            }
            return Err(ProviderError::Api {
                provider: PROVIDER_NAME.to_string(),
                status: status.as_u16(),
                body: error_message(&body),
            }
            .into());
        }

        let chat: ChatResponse = response
            .json()
            .await
            .context("Failed to parse Mistral API response")?;

        tracing::debug!(id = %chat.id, model = %chat.model, "Received completion");

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| {
                if let Some(reason) = &choice.finish_reason {
                    tracing::trace!(finish_reason = %reason, "Completion finished");
                }
                choice.message.content
            })
            .ok_or_else(|| {
                ProviderError::EmptyResponse {
                    provider: PROVIDER_NAME.to_string(),
                }
                .into()
            })
    }
}

#[async_trait]
impl LlmProvider for MistralProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        with_rate_limit_retry(self.retry, || self.complete_once(prompt)).await
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn default_model(&self) -> &str {
        &self.model
    }
}

/// The `message` field of a JSON error body, or the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
