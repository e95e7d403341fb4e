// Brave Web Search client

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use super::SearchProvider;
use crate::config::constants::DEFAULT_BRAVE_URL;
use crate::config::SearchConfig;
use crate::conversation::SearchRecord;

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct BraveSearchProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl BraveSearchProvider {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BRAVE_URL.to_string(),
        })
    }

    /// Build from config; `None` when no search key is configured
    pub fn from_config(config: &SearchConfig) -> Result<Option<Self>> {
        match config.api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Ok(Some(
                Self::new(key.to_string())?.with_base_url(config.base_url.clone()),
            )),
            None => Ok(None),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl SearchProvider for BraveSearchProvider {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchRecord>> {
        let url = format!("{}/res/v1/web/search", self.base_url);
        let count_param = count.to_string();

        tracing::debug!(query = %query, count, "Sending web search request");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-Subscription-Token", &self.api_key)
            .query(&[("q", query), ("count", count_param.as_str())])
            .send()
            .await
            .context("Failed to send request to Brave Search API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!(
                "Brave Search API request failed\n\nStatus: {}\nBody: {}",
                status,
                body
            );
        }

        let parsed: BraveResponse = response
            .json()
            .await
            .context("Failed to parse Brave Search API response")?;

        let records: Vec<SearchRecord> = parsed
            .web
            .map(|web| web.results)
            .unwrap_or_default()
            .into_iter()
            .take(count)
            .map(|r| SearchRecord::new(clean_snippet(&r.title), clean_snippet(&r.description)))
            .collect();

        tracing::debug!(results = records.len(), "Web search complete");

        Ok(records)
    }

    fn name(&self) -> &str {
        "brave"
    }
}

/// Snippet text as plain prose: inline markup such as `<strong>` removed
/// and HTML entities decoded
fn clean_snippet(text: &str) -> String {
    decode_entities(&strip_tags(text))
}

/// Drop tags; a `<` that does not open a tag is kept as text
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let opens_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');

        match after.find('>') {
            Some(end) if opens_tag => rest = &after[end + 1..],
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decode named entities Brave emits plus decimal and hex references.
/// Unknown entities are left as written.
fn decode_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let decoded = after
            .find(';')
            .filter(|&end| end <= MAX_ENTITY_LEN)
            .and_then(|end| entity_char(&after[..end]).map(|c| (c, end)));

        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &after[end + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

const MAX_ENTITY_LEN: usize = 8;

fn entity_char(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => {
            let code = match name.strip_prefix('#')? {
                hex if hex.starts_with(['x', 'X']) => u32::from_str_radix(&hex[1..], 16).ok()?,
                dec => dec.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

// Brave API types

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}
