// Project-wide constants
//
// Centralised here so limits, URLs and other magic values have one
// source of truth. Import via `use crate::config::constants::*;`.

/// Default number of Brainstormer → Critic → Synthesizer → Moderator rounds.
pub const DEFAULT_ITERATION_LIMIT: usize = 3;

/// Maximum transcript entries kept per user before the oldest is evicted.
pub const MAX_MEMORY_LENGTH: usize = 10;

/// How many ranked search records the search processor considers.
pub const SEARCH_RESULT_COUNT: usize = 5;

/// Maximum number of "Key Facts" bullets extracted from search descriptions.
pub const KEY_FACT_LIMIT: usize = 5;

/// Default completion model.
pub const DEFAULT_MODEL: &str = "mistral-large-latest";

/// Default Mistral API root (OpenAI-compatible `/v1/chat/completions`).
pub const DEFAULT_MISTRAL_URL: &str = "https://api.mistral.ai";

/// Default Brave Search API root.
pub const DEFAULT_BRAVE_URL: &str = "https://api.search.brave.com";

/// Default maximum tokens for a single persona completion.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Fixed pause before retrying a rate-limited completion.
pub const RATE_LIMIT_DELAY_SECS: u64 = 5;

/// Retries allowed after the first rate-limited attempt.
pub const RATE_LIMIT_MAX_RETRIES: u32 = 1;

/// Directory under `$HOME` holding `config.toml`.
pub const CONFIG_DIR_NAME: &str = ".council";
