// Completion providers
//
// The conversation controller only needs "prompt in, text out". Providers
// own transport, authentication and the rate-limit retry policy.

use anyhow::Result;
use async_trait::async_trait;

pub mod mistral;
pub mod retry;
pub mod types;

pub use mistral::MistralProvider;
pub use retry::{with_rate_limit_retry, RetryPolicy, RATE_LIMIT_FALLBACK};
pub use types::{ChatMessage, ProviderError};

/// Trait for LLM completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a single prompt.
    ///
    /// Rate limiting is handled inside the provider; any error returned
    /// here is final for this call.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging (e.g. "mistral")
    fn name(&self) -> &str;

    /// Model used when none is configured
    fn default_model(&self) -> &str;
}
