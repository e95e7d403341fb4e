// Scripted collaborators shared by the integration tests

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use council::config::ConversationSettings;
use council::conversation::{
    ConversationController, ConversationEvent, EventSender, MemoryStore, SearchRecord,
};
use council::providers::LlmProvider;
use council::search::SearchProvider;

/// Replies from a fixed script and records every prompt it receives
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    /// Same reply for every call
    pub fn repeating(reply: &str, times: usize) -> Arc<Self> {
        let replies: Vec<&str> = std::iter::repeat(reply).take(times).collect();
        Self::new(&replies)
    }

    /// Script whose call at `failing_call` (0-based) errors
    pub fn failing_at(replies: &[&str], failing_call: usize) -> Arc<Self> {
        let mut script: VecDeque<Result<String, String>> =
            replies.iter().map(|r| Ok(r.to_string())).collect();
        script.insert(failing_call, Err("upstream unavailable".to_string()));
        Arc::new(Self {
            replies: Mutex::new(script),
            prompts: Mutex::new(Vec::new()),
            delay: None,
        })
    }

    /// Same reply for every call, each call sleeping for `delay` first
    pub fn slow(reply: &str, times: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new((0..times).map(|_| Ok(reply.to_string())).collect()),
            prompts: Mutex::new(Vec::new()),
            delay: Some(delay),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => Err(anyhow!(e)),
            None => Err(anyhow!("script exhausted")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-model"
    }
}

/// Returns the same records for every query and records the queries
pub struct FixedSearch {
    records: Vec<SearchRecord>,
    queries: Mutex<Vec<String>>,
}

impl FixedSearch {
    pub fn new(records: Vec<SearchRecord>) -> Arc<Self> {
        Arc::new(Self {
            records,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for FixedSearch {
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchRecord>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.records.iter().take(count).cloned().collect())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

pub fn settings(iteration_limit: usize, use_memory: bool) -> ConversationSettings {
    ConversationSettings {
        iteration_limit,
        use_memory,
        ..Default::default()
    }
}

pub fn controller(provider: Arc<ScriptedProvider>, settings: ConversationSettings) -> ConversationController {
    let memory = Arc::new(MemoryStore::with_max_length(settings.max_memory_length));
    ConversationController::new(provider, memory, settings)
}

pub fn channel() -> (EventSender, mpsc::UnboundedReceiver<ConversationEvent>) {
    mpsc::unbounded_channel()
}

pub fn drain(rx: &mut mpsc::UnboundedReceiver<ConversationEvent>) -> Vec<ConversationEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
