// Conversation controller - drives persona turns, search sub-rounds and termination

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::Instrument;

use super::memory::MemoryStore;
use super::personas::{build_prompt, Persona};
use super::search::{build_search_decision_prompt, process_results};
use super::sentinel::{
    parse_moderator_verdict, parse_search_directive, parse_search_flag, ModeratorVerdict,
    FALLBACK_SUMMARY,
};
use super::transcript::{Speaker, Transcript};
use super::types::{ConversationEvent, ConversationOutcome, IterationState, OutcomeStatus};
use crate::config::constants::SEARCH_RESULT_COUNT;
use crate::config::ConversationSettings;
use crate::providers::LlmProvider;
use crate::search::SearchProvider;

/// Receiving end is the display layer; events arrive in display order
pub type EventSender = UnboundedSender<ConversationEvent>;

/// Search sub-round has two steps: decide, then summarize
const SEARCH_STEPS: usize = 2;

const SEARCH_UNAVAILABLE: &str =
    "This question needs a web search, but web search is not configured.";

/// Result of one search sub-round
#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchRound {
    /// The decision step answered without asking for a search
    Answered(String),
    /// A search ran and the Search persona summarized it
    Summarized { query: String, summary: String },
    /// A search was requested but no search provider is configured
    Unavailable { query: String },
}

/// Working transcript for one trigger.
///
/// In memory mode the transcript is seeded from the user's stored (capped)
/// history and every append is also written to the store. The working copy
/// keeps all of the current trigger's entries even after the store evicts
/// them, so late turns in a long conversation still see the question. In
/// stateless mode the transcript lives only for the request.
struct Session<'a> {
    user_id: &'a str,
    memory: Option<&'a MemoryStore>,
    transcript: Transcript,
}

impl<'a> Session<'a> {
    fn new(user_id: &'a str, memory: Option<&'a MemoryStore>) -> Self {
        let transcript = memory.map(|m| m.get(user_id)).unwrap_or_default();
        Self {
            user_id,
            memory,
            transcript,
        }
    }

    fn append(&mut self, speaker: Speaker, text: &str) {
        if let Some(memory) = self.memory {
            memory.append(self.user_id, speaker, text);
        }
        self.transcript.push(speaker, text);
    }

    fn transcript(&self) -> &Transcript {
        &self.transcript
    }
}

/// Sequences persona turns against one completion provider.
///
/// Each trigger holds the user's conversation lock for its whole duration;
/// turns within a trigger run strictly one after another because every
/// prompt depends on the turn before it.
pub struct ConversationController {
    provider: Arc<dyn LlmProvider>,
    search: Option<Arc<dyn SearchProvider>>,
    search_count: usize,
    memory: Arc<MemoryStore>,
    settings: ConversationSettings,
}

impl ConversationController {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        memory: Arc<MemoryStore>,
        settings: ConversationSettings,
    ) -> Self {
        Self {
            provider,
            search: None,
            search_count: SEARCH_RESULT_COUNT,
            memory,
            settings,
        }
    }

    pub fn with_search(mut self, search: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(search);
        self
    }

    /// Number of records requested per search
    pub fn with_search_count(mut self, count: usize) -> Self {
        self.search_count = count.max(1);
        self
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    /// One Brainstormer turn
    pub async fn brainstorm(
        &self,
        user_id: &str,
        question: &str,
        events: &EventSender,
    ) -> Result<ConversationOutcome> {
        self.single_persona(user_id, Persona::Brainstormer, question, events)
            .instrument(conversation_span(user_id, "brainstorm"))
            .await
    }

    /// One Critic turn
    pub async fn critique(
        &self,
        user_id: &str,
        idea: &str,
        events: &EventSender,
    ) -> Result<ConversationOutcome> {
        self.single_persona(user_id, Persona::Critic, idea, events)
            .instrument(conversation_span(user_id, "critique"))
            .await
    }

    /// Search decision, then (if requested) search + summary
    pub async fn search_agent(
        &self,
        user_id: &str,
        question: &str,
        events: &EventSender,
    ) -> Result<ConversationOutcome> {
        self.run_search_agent(user_id, question, events)
            .instrument(conversation_span(user_id, "searchagent"))
            .await
    }

    /// Full Brainstormer → Critic → Synthesizer → Moderator loop.
    ///
    /// `input` may start with `--search` to run a search sub-round first.
    pub async fn multiagent(
        &self,
        user_id: &str,
        input: &str,
        events: &EventSender,
    ) -> Result<ConversationOutcome> {
        self.run_multiagent(user_id, input, events)
            .instrument(conversation_span(user_id, "multiagent"))
            .await
    }

    /// Forget the user's transcript; false if there was nothing stored
    pub fn clear_memory(&self, user_id: &str) -> bool {
        self.memory.clear(user_id)
    }

    // ── Triggers ───────────────────────────────────────────────────────────────

    async fn single_persona(
        &self,
        user_id: &str,
        persona: Persona,
        text: &str,
        events: &EventSender,
    ) -> Result<ConversationOutcome> {
        let _guard = self.memory.lock_user(user_id).await;
        let mut session = self.session(user_id);

        session.append(Speaker::User, text);
        let reply = self.run_persona(&mut session, persona, 1, 1).await?;

        emit(
            events,
            ConversationEvent::Reply {
                label: persona.name(),
                text: reply.clone(),
            },
        );
        Ok(ConversationOutcome::new(OutcomeStatus::Answered, reply))
    }

    async fn run_search_agent(
        &self,
        user_id: &str,
        question: &str,
        events: &EventSender,
    ) -> Result<ConversationOutcome> {
        let _guard = self.memory.lock_user(user_id).await;
        let mut session = self.session(user_id);

        session.append(Speaker::User, question);

        let outcome = match self.search_round(&session, None).await? {
            SearchRound::Answered(answer) => {
                session.append(Speaker::SearchAgent, &answer);
                ConversationOutcome::new(OutcomeStatus::Answered, answer)
            }
            SearchRound::Summarized { summary, .. } => {
                session.append(Speaker::SearchAgent, &summary);
                ConversationOutcome::new(OutcomeStatus::SearchSummarized, summary)
            }
            SearchRound::Unavailable { .. } => {
                emit(events, ConversationEvent::Notice(SEARCH_UNAVAILABLE.to_string()));
                return Ok(ConversationOutcome::new(
                    OutcomeStatus::SearchUnavailable,
                    SEARCH_UNAVAILABLE,
                ));
            }
        };

        emit(
            events,
            ConversationEvent::Reply {
                label: "Search Agent",
                text: outcome.text.clone(),
            },
        );
        Ok(outcome)
    }

    async fn run_multiagent(
        &self,
        user_id: &str,
        input: &str,
        events: &EventSender,
    ) -> Result<ConversationOutcome> {
        let _guard = self.memory.lock_user(user_id).await;
        let mut session = self.session(user_id);

        let (use_search, question) = parse_search_flag(input);
        session.append(Speaker::User, question);
        emit(events, ConversationEvent::Started);

        tracing::info!(
            use_search,
            iteration_limit = self.settings.iteration_limit,
            "Starting multi-agent conversation"
        );

        if use_search {
            match self.search_round(&session, Some(events)).await? {
                SearchRound::Summarized { query, summary } => {
                    tracing::info!(query = %query, "Search results added to conversation");
                    emit(
                        events,
                        ConversationEvent::Reply {
                            label: "Search Agent",
                            text: summary.clone(),
                        },
                    );
                    session.append(Speaker::SearchResults, &search_results_entry(&summary));
                }
                SearchRound::Answered(_) => {
                    tracing::debug!("Search decision needed no search; continuing without results");
                }
                SearchRound::Unavailable { query } => {
                    tracing::warn!(query = %query, "Search requested but not configured; skipping");
                }
            }
        }

        let mut state = IterationState::new(self.settings.iteration_limit);
        let mut last_moderator = String::new();

        while !state.is_exhausted() {
            emit(
                events,
                ConversationEvent::IterationStarted {
                    current: state.current,
                    limit: state.limit,
                },
            );

            for persona in Persona::ROUND {
                let text = self
                    .run_persona(&mut session, persona, state.current, state.limit)
                    .await?;
                emit(
                    events,
                    ConversationEvent::PersonaTurn {
                        persona,
                        text: text.clone(),
                    },
                );
                if persona == Persona::Moderator {
                    last_moderator = text;
                }
            }

            match parse_moderator_verdict(&last_moderator) {
                ModeratorVerdict::Summary(summary) => {
                    tracing::info!(rounds = state.current, "Moderator ended the conversation");
                    emit(events, ConversationEvent::FinalSummary(summary.clone()));
                    return Ok(ConversationOutcome::new(OutcomeStatus::Summarized, summary)
                        .with_rounds(state.current));
                }
                ModeratorVerdict::MissingSummary => {
                    tracing::warn!(
                        rounds = state.current,
                        "Moderator signalled CONVO_OVER without a summary"
                    );
                    emit(
                        events,
                        ConversationEvent::FinalSummary(FALLBACK_SUMMARY.to_string()),
                    );
                    return Ok(
                        ConversationOutcome::new(OutcomeStatus::FallbackSummary, FALLBACK_SUMMARY)
                            .with_rounds(state.current),
                    );
                }
                ModeratorVerdict::Continue => state.advance(),
            }
        }

        tracing::info!(rounds = state.limit, "All iterations complete without a summary");
        emit(events, ConversationEvent::IterationsExhausted);
        Ok(
            ConversationOutcome::new(OutcomeStatus::IterationsExhausted, last_moderator)
                .with_rounds(state.limit),
        )
    }

    // ── Private helpers ────────────────────────────────────────────────────────

    fn session<'a>(&'a self, user_id: &'a str) -> Session<'a> {
        let memory = self
            .settings
            .use_memory
            .then_some(self.memory.as_ref());
        Session::new(user_id, memory)
    }

    /// Render, complete, and record one persona turn
    async fn run_persona(
        &self,
        session: &mut Session<'_>,
        persona: Persona,
        iteration: usize,
        iteration_limit: usize,
    ) -> Result<String> {
        let prompt = build_prompt(persona, session.transcript(), iteration, iteration_limit);
        let reply = self.complete(persona, &prompt, iteration).await?;
        session.append(persona.speaker(), &reply);
        Ok(reply)
    }

    /// Decide whether to search and, if so, search and summarize.
    ///
    /// Nothing is appended to the session here; callers record the outcome
    /// the way their trigger requires.
    async fn search_round(
        &self,
        session: &Session<'_>,
        announce: Option<&EventSender>,
    ) -> Result<SearchRound> {
        let transcript = session.transcript();
        let prompt = build_search_decision_prompt(transcript, 1, SEARCH_STEPS);
        let decision = self.complete(Persona::SearchDecision, &prompt, 1).await?;

        let Some(query) = parse_search_directive(&decision) else {
            return Ok(SearchRound::Answered(decision));
        };

        // An empty directive still asks for a search; fall back to the question itself
        let query = if query.is_empty() {
            transcript
                .last_from(Speaker::User)
                .map(|e| e.text().to_string())
                .unwrap_or_default()
        } else {
            query
        };

        let Some(search) = &self.search else {
            return Ok(SearchRound::Unavailable { query });
        };

        if let Some(events) = announce {
            emit(events, ConversationEvent::SearchStarted);
        }
        let records = search
            .search(&query, self.search_count)
            .await
            .with_context(|| format!("{} search failed for query {:?}", search.name(), query))?;

        tracing::info!(query = %query, results = records.len(), "Web search complete");

        let prompt = process_results(transcript, &records, SEARCH_STEPS, SEARCH_STEPS);
        let summary = self
            .complete(Persona::SearchSummary, &prompt, SEARCH_STEPS)
            .await?;

        Ok(SearchRound::Summarized { query, summary })
    }

    async fn complete(&self, persona: Persona, prompt: &str, iteration: usize) -> Result<String> {
        tracing::debug!(
            persona = %persona,
            iteration,
            prompt_chars = prompt.len(),
            "Invoking persona"
        );

        let reply = self
            .provider
            .complete(prompt)
            .await
            .with_context(|| format!("{} completion failed", persona))?;

        tracing::debug!(persona = %persona, reply_chars = reply.len(), "Persona replied");
        Ok(reply)
    }
}

/// SearchResults entry wrapping a search summary with its provenance
fn search_results_entry(summary: &str) -> String {
    format!(
        "The following information was gathered from a web search as of today's date and \
         should be treated as accurate: {}",
        summary
    )
}

fn conversation_span(user_id: &str, trigger: &'static str) -> tracing::Span {
    tracing::info_span!(
        "conversation",
        conversation_id = %uuid::Uuid::new_v4(),
        user = %user_id,
        trigger
    )
}

fn emit(events: &EventSender, event: ConversationEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Display receiver dropped; event discarded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tokio::sync::mpsc;

    use crate::conversation::SearchRecord;

    /// Replies from a script, recording every prompt it was given
    struct ScriptedProvider {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn new(replies: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| anyhow::anyhow!("script exhausted"))
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn default_model(&self) -> &str {
            "scripted"
        }
    }

    struct FixedSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        async fn search(&self, query: &str, _count: usize) -> Result<Vec<SearchRecord>> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(vec![SearchRecord::new("Rust", "Rust is fast. Go is simple.")])
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn controller(provider: Arc<ScriptedProvider>, use_memory: bool) -> ConversationController {
        let settings = ConversationSettings {
            use_memory,
            ..Default::default()
        };
        ConversationController::new(provider, Arc::new(MemoryStore::new()), settings)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ConversationEvent>) -> Vec<ConversationEvent> {
        let mut out = Vec::new();
        while let Ok(event) = rx.try_recv() {
            out.push(event);
        }
        out
    }

    #[tokio::test]
    async fn test_session_stateless_does_not_touch_memory() {
        let provider = ScriptedProvider::new(&["idea"]);
        let ctl = controller(provider, false);
        let (tx, _rx) = mpsc::unbounded_channel();

        ctl.brainstorm("u", "q", &tx).await.unwrap();
        assert!(ctl.memory().get("u").is_empty());
    }

    #[test]
    fn test_session_keeps_request_entries_past_store_cap() {
        let memory = MemoryStore::with_max_length(2);
        memory.append("u", Speaker::User, "earlier");

        let mut session = Session::new("u", Some(&memory));
        session.append(Speaker::User, "question");
        session.append(Speaker::Brainstormer, "idea");
        session.append(Speaker::Critic, "flaw");

        assert_eq!(
            session.transcript().render(),
            "User: earlier\nUser: question\nBrainstormer: idea\nCritic: flaw"
        );
        assert_eq!(memory.get("u").render(), "Brainstormer: idea\nCritic: flaw");
    }

    #[tokio::test]
    async fn test_moderator_fallback_summary() {
        let provider = ScriptedProvider::new(&["b", "c", "s", "We're done. CONVO_OVER."]);
        let ctl = controller(provider, true);
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = ctl.multiagent("u", "q", &tx).await.unwrap();
        assert_eq!(outcome.status, OutcomeStatus::FallbackSummary);
        assert_eq!(outcome.text, FALLBACK_SUMMARY);
        assert_eq!(outcome.rounds, 1);

        let events = drain(&mut rx);
        assert_eq!(
            events.last(),
            Some(&ConversationEvent::FinalSummary(FALLBACK_SUMMARY.to_string()))
        );
    }

    #[tokio::test]
    async fn test_empty_directive_searches_for_question() {
        let provider = ScriptedProvider::new(&["DO_SEARCH:", "summary"]);
        let search = Arc::new(FixedSearch {
            queries: Mutex::new(Vec::new()),
        });
        let ctl = controller(provider, true).with_search(search.clone());
        let (tx, _rx) = mpsc::unbounded_channel();

        ctl.search_agent("u", "latest rust release", &tx).await.unwrap();
        assert_eq!(*search.queries.lock().unwrap(), vec!["latest rust release"]);
    }

    #[tokio::test]
    async fn test_failed_round_keeps_partial_memory() {
        // Script runs out during the Critic turn
        let provider = ScriptedProvider::new(&["idea"]);
        let ctl = controller(provider.clone(), true);
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = ctl.multiagent("u", "q", &tx).await.unwrap_err();
        assert!(format!("{:#}", err).contains("Critic completion failed"));

        let memory = ctl.memory().get("u");
        assert_eq!(memory.render(), "User: q\nBrainstormer: idea");
        assert_eq!(provider.prompts().len(), 2);
    }

    #[test]
    fn test_search_results_entry_preamble() {
        let entry = search_results_entry("Rust 1.80 is out.");
        assert!(entry.contains("as of today's date"));
        assert!(entry.ends_with("Rust 1.80 is out."));
    }
}
