// Search result processing - relevance stratification and key-fact extraction
//
// A best-effort heuristic formatter: keyword overlap with the user's latest
// question decides which records are shown first, and sentences mentioning a
// keyword become "Key Facts". Pure functions; same inputs, same output.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::personas::{build_prompt, build_prompt_with_context, Persona};
use super::transcript::{Speaker, Transcript};
use crate::config::constants::{KEY_FACT_LIMIT, SEARCH_RESULT_COUNT};

/// Keyword overlaps needed for a record to count as highly relevant
const HIGH_RELEVANCE_MATCHES: usize = 2;

/// One ranked web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub title: String,
    pub description: String,
}

impl SearchRecord {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Top search records split by relevance, plus extracted fact sentences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankedSearchContext {
    pub question: String,
    pub highly_relevant: Vec<SearchRecord>,
    pub somewhat_relevant: Vec<SearchRecord>,
    pub key_facts: Vec<String>,
}

impl RankedSearchContext {
    /// Rank the first five `records` against `question`
    pub fn rank(question: &str, records: &[SearchRecord]) -> Self {
        let keywords = keywords(question);
        let top = &records[..records.len().min(SEARCH_RESULT_COUNT)];

        let (highly_relevant, somewhat_relevant): (Vec<SearchRecord>, Vec<SearchRecord>) = top
            .iter()
            .cloned()
            .partition(|r| keyword_matches(r, &keywords) >= HIGH_RELEVANCE_MATCHES);

        Self {
            question: question.to_string(),
            highly_relevant,
            somewhat_relevant,
            key_facts: extract_key_facts(top, &keywords),
        }
    }

    /// Text block handed to the Search persona's summarization prompt
    pub fn render(&self) -> String {
        let mut out = format!("Original question: {}\n\n", self.question);

        out.push_str("Most Relevant Information:\n");
        push_numbered(&mut out, &self.highly_relevant);

        out.push_str("\nAdditional Information:\n");
        push_numbered(&mut out, &self.somewhat_relevant);

        out.push_str("\nKey Facts:\n");
        for fact in &self.key_facts {
            out.push_str(&format!("- {}.\n", fact));
        }

        out
    }
}

/// Prompt asking the Search persona whether a web search is needed
pub fn build_search_decision_prompt(
    transcript: &Transcript,
    iteration: usize,
    iteration_limit: usize,
) -> String {
    build_prompt(Persona::SearchDecision, transcript, iteration, iteration_limit)
}

/// Prompt asking the Search persona to answer from `records`.
///
/// The original question is the most recent `User` entry in the transcript.
pub fn process_results(
    transcript: &Transcript,
    records: &[SearchRecord],
    iteration: usize,
    iteration_limit: usize,
) -> String {
    let question = transcript
        .last_from(Speaker::User)
        .map(|e| e.text())
        .unwrap_or_default();
    let context = RankedSearchContext::rank(question, records);

    tracing::debug!(
        highly_relevant = context.highly_relevant.len(),
        somewhat_relevant = context.somewhat_relevant.len(),
        key_facts = context.key_facts.len(),
        "Ranked search results"
    );

    build_prompt_with_context(
        Persona::SearchSummary,
        transcript,
        iteration,
        iteration_limit,
        &context.render(),
    )
}

/// Lowercase whitespace-separated words of the question, deduplicated
fn keywords(question: &str) -> HashSet<String> {
    question
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect()
}

/// Number of distinct keywords occurring in the record's title + description
fn keyword_matches(record: &SearchRecord, keywords: &HashSet<String>) -> usize {
    let haystack = format!("{} {}", record.title, record.description).to_lowercase();
    keywords
        .iter()
        .filter(|kw| haystack.contains(kw.as_str()))
        .count()
}

fn extract_key_facts(records: &[SearchRecord], keywords: &HashSet<String>) -> Vec<String> {
    let combined = records
        .iter()
        .map(|r| r.description.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    combined
        .split('.')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| {
            let lower = s.to_lowercase();
            keywords.iter().any(|kw| lower.contains(kw.as_str()))
        })
        .take(KEY_FACT_LIMIT)
        .map(str::to_string)
        .collect()
}

fn push_numbered(out: &mut String, records: &[SearchRecord]) {
    for (i, record) in records.iter().enumerate() {
        out.push_str(&format!("{}. {}: {}\n", i + 1, record.title, record.description));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<SearchRecord> {
        vec![
            SearchRecord::new("Top programming languages", "Which language should you learn first."),
            SearchRecord::new("Coffee brewing guide", "How to brew a better cup."),
            SearchRecord::new("Programming language rankings", "The yearly language index is out."),
            SearchRecord::new("Gardening tips", "Spring planting advice."),
            SearchRecord::new("Travel deals", "Cheap flights this week."),
        ]
    }

    #[test]
    fn test_stratification() {
        let ctx = RankedSearchContext::rank("best programming language", &records());
        let high: Vec<&str> = ctx.highly_relevant.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(high, ["Top programming languages", "Programming language rankings"]);
        assert_eq!(ctx.somewhat_relevant.len(), 3);
    }

    #[test]
    fn test_only_first_five_records_considered() {
        let mut recs = records();
        recs.push(SearchRecord::new(
            "Best programming language",
            "Best programming language debate.",
        ));
        let ctx = RankedSearchContext::rank("best programming language", &recs);
        assert_eq!(ctx.highly_relevant.len() + ctx.somewhat_relevant.len(), 5);
        assert!(ctx.key_facts.iter().all(|f| !f.contains("debate")));
    }

    #[test]
    fn test_key_facts_contain_keywords() {
        let ctx = RankedSearchContext::rank("best programming language", &records());
        assert_eq!(
            ctx.key_facts,
            vec![
                "Which language should you learn first".to_string(),
                "The yearly language index is out".to_string(),
            ]
        );
    }

    #[test]
    fn test_key_facts_capped_at_five() {
        let recs = vec![SearchRecord::new(
            "rust",
            "Rust a. Rust b. Rust c. Rust d. Rust e. Rust f. Rust g.",
        )];
        let ctx = RankedSearchContext::rank("rust", &recs);
        assert_eq!(ctx.key_facts.len(), 5);
        assert_eq!(ctx.key_facts[0], "Rust a");
    }

    #[test]
    fn test_empty_records_render_empty_sections() {
        let ctx = RankedSearchContext::rank("anything", &[]);
        assert!(ctx.highly_relevant.is_empty());
        assert!(ctx.somewhat_relevant.is_empty());
        assert!(ctx.key_facts.is_empty());

        let rendered = ctx.render();
        assert!(rendered.contains("Most Relevant Information:\n\nAdditional Information:\n\nKey Facts:\n"));
    }

    #[test]
    fn test_render_numbers_each_group_from_one() {
        let ctx = RankedSearchContext::rank("best programming language", &records());
        let rendered = ctx.render();
        let additional = rendered.find("Additional Information:").unwrap();
        assert!(rendered[..additional].contains("1. Top programming languages"));
        assert!(rendered[..additional].contains("2. Programming language rankings"));
        assert!(rendered[additional..].contains("1. Coffee brewing guide"));
        assert!(rendered[additional..].contains("3. Travel deals"));
    }

    #[test]
    fn test_process_results_uses_latest_user_entry() {
        let mut transcript = Transcript::new();
        transcript.push(Speaker::User, "old gardening question");
        transcript.push(Speaker::SearchAgent, "earlier answer");
        transcript.push(Speaker::User, "best programming language");

        let prompt = process_results(&transcript, &records(), 2, 2);
        assert!(prompt.contains("Original question: best programming language"));
        assert!(prompt.contains("[Search Results]"));
        assert!(prompt.contains("Current iteration: 2 of 2."));
        assert_eq!(prompt, process_results(&transcript, &records(), 2, 2));
    }

    #[test]
    fn test_decision_prompt() {
        let mut transcript = Transcript::new();
        transcript.push(Speaker::User, "who won yesterday's game?");
        let prompt = build_search_decision_prompt(&transcript, 1, 2);
        assert!(prompt.contains("DO_SEARCH"));
        assert!(prompt.contains("User: who won yesterday's game?"));
        assert!(prompt.contains("Current iteration: 1 of 2."));
    }
}
