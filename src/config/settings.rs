// Configuration structs

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::*;

/// Completion provider settings (Mistral chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key; an empty key is filled from `MISTRAL_API_KEY` by the loader
    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_mistral_url")]
    pub base_url: String,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_mistral_url(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Rate-limit retry policy for the completion provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_rate_limit_delay_secs")]
    pub rate_limit_delay_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl RetryConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.rate_limit_delay_secs)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            rate_limit_delay_secs: default_rate_limit_delay_secs(),
            max_retries: default_max_retries(),
        }
    }
}

/// Web search settings (Brave Search). Search is disabled when no key is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_brave_url")]
    pub base_url: String,

    #[serde(default = "default_result_count")]
    pub result_count: usize,
}

impl SearchConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_brave_url(),
            result_count: default_result_count(),
        }
    }
}

/// Conversation controller settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSettings {
    /// Maximum multiagent rounds before forced termination
    #[serde(default = "default_iteration_limit")]
    pub iteration_limit: usize,

    /// Per-user transcript cap (FIFO eviction beyond it)
    #[serde(default = "default_max_memory_length")]
    pub max_memory_length: usize,

    /// Seed each trigger from the user's stored transcript
    #[serde(default = "default_true")]
    pub use_memory: bool,
}

impl Default for ConversationSettings {
    fn default() -> Self {
        Self {
            iteration_limit: default_iteration_limit(),
            max_memory_length: default_max_memory_length(),
            use_memory: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub conversation: ConversationSettings,
}

impl Config {
    /// Reject values the controller cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_key.trim().is_empty() {
            bail!("provider.api_key is empty");
        }
        if self.conversation.iteration_limit == 0 {
            bail!("conversation.iteration_limit must be at least 1");
        }
        if self.conversation.max_memory_length == 0 {
            bail!("conversation.max_memory_length must be at least 1");
        }
        if self.search.result_count == 0 {
            bail!("search.result_count must be at least 1");
        }
        Ok(())
    }
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_mistral_url() -> String {
    DEFAULT_MISTRAL_URL.to_string()
}

fn default_brave_url() -> String {
    DEFAULT_BRAVE_URL.to_string()
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

fn default_rate_limit_delay_secs() -> u64 {
    RATE_LIMIT_DELAY_SECS
}

fn default_max_retries() -> u32 {
    RATE_LIMIT_MAX_RETRIES
}

fn default_result_count() -> usize {
    SEARCH_RESULT_COUNT
}

fn default_iteration_limit() -> usize {
    DEFAULT_ITERATION_LIMIT
}

fn default_max_memory_length() -> usize {
    MAX_MEMORY_LENGTH
}
