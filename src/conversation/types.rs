// Conversation types - IterationState, ConversationEvent, ConversationOutcome

use std::fmt;

use super::personas::Persona;

const DIVIDER: &str = "\n--------------------------------\n";

/// Round counter for a multiagent conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationState {
    pub current: usize,
    pub limit: usize,
}

impl IterationState {
    pub fn new(limit: usize) -> Self {
        Self { current: 1, limit }
    }

    pub fn is_exhausted(&self) -> bool {
        self.current > self.limit
    }

    pub fn advance(&mut self) {
        self.current += 1;
    }
}

/// One chunk of user-visible output, emitted in order as the conversation runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationEvent {
    /// Multiagent conversation is starting
    Started,
    /// Web search sub-round is starting
    SearchStarted,
    /// A new Brainstormer → Moderator round begins
    IterationStarted { current: usize, limit: usize },
    /// One persona's turn within a round
    PersonaTurn { persona: Persona, text: String },
    /// The single reply of a one-shot trigger (brainstorm, critique, searchagent)
    Reply { label: &'static str, text: String },
    /// Moderator converged; the summary (or fallback) for the user
    FinalSummary(String),
    /// The iteration limit was reached without convergence
    IterationsExhausted,
    /// Informational message that is not a persona reply
    Notice(String),
}

impl ConversationEvent {
    /// The literal text displayed for this event
    pub fn render(&self) -> String {
        match self {
            ConversationEvent::Started => "**Starting multi-agent conversation...**".to_string(),
            ConversationEvent::SearchStarted => {
                "**Searching the web for relevant information...**".to_string()
            }
            ConversationEvent::IterationStarted { current, limit } => {
                format!("**Iteration {} of {}**", current, limit)
            }
            ConversationEvent::PersonaTurn { persona, text } => {
                format!("**{}:**\n{}{}", persona.name(), text, DIVIDER)
            }
            ConversationEvent::Reply { label, text } => {
                format!("**{}'s Response:**\n{}", label, text)
            }
            ConversationEvent::FinalSummary(summary) => format!(
                "```\n== FINAL RESPONSE ==\n```\n**{}**\n```\nEnd of multi-agent conversation\n```",
                summary
            ),
            ConversationEvent::IterationsExhausted => "**All iterations complete.**".to_string(),
            ConversationEvent::Notice(text) => text.clone(),
        }
    }
}

impl fmt::Display for ConversationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// How a trigger ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// A single persona (or the search decision) answered directly
    Answered,
    /// Search was requested and its summary is the answer
    SearchSummarized,
    /// The Moderator converged with an explicit summary
    Summarized,
    /// The Moderator converged but gave no summary; text is the fallback
    FallbackSummary,
    /// Every round ran without convergence; text is the last Moderator turn
    IterationsExhausted,
    /// Search was requested but no search provider is configured
    SearchUnavailable,
}

/// Structured result returned alongside the emitted display events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationOutcome {
    pub status: OutcomeStatus,
    pub text: String,
    /// Completed multiagent rounds (0 for one-shot triggers)
    pub rounds: usize,
}

impl ConversationOutcome {
    pub fn new(status: OutcomeStatus, text: impl Into<String>) -> Self {
        Self {
            status,
            text: text.into(),
            rounds: 0,
        }
    }

    pub fn with_rounds(mut self, rounds: usize) -> Self {
        self.rounds = rounds;
        self
    }
}
