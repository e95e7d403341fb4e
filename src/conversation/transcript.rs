// Transcript types - speaker-tagged conversation log

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who produced a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Brainstormer,
    Critic,
    Synthesizer,
    Moderator,
    SearchAgent,
    SearchResults,
}

impl Speaker {
    /// Label used when the entry is rendered into a prompt
    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::User => "User",
            Speaker::Brainstormer => "Brainstormer",
            Speaker::Critic => "Critic",
            Speaker::Synthesizer => "Synthesizer",
            Speaker::Moderator => "Moderator",
            Speaker::SearchAgent => "SearchAgent",
            Speaker::SearchResults => "SearchResults",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single immutable line of the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    speaker: Speaker,
    text: String,
}

impl TranscriptEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// `"<speaker>: <text>"`
    pub fn render(&self) -> String {
        format!("{}: {}", self.speaker, self.text)
    }
}

/// Append-only ordered log of entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = TranscriptEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push(TranscriptEntry::new(speaker, text));
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent entry from `speaker`, scanning from the end
    pub fn last_from(&self, speaker: Speaker) -> Option<&TranscriptEntry> {
        self.entries.iter().rev().find(|e| e.speaker == speaker)
    }

    /// The conversation-history block every persona prompt embeds:
    /// one `"<speaker>: <text>"` line per entry, in insertion order.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(TranscriptEntry::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}
