// Sentinel tokens exchanged with the model, and the trigger's search flag
//
// All literal-token detection lives here so the matching strategy can be
// tightened (e.g. anchoring to line start) without touching the controller.
// Matching is currently unanchored substring search.

/// Search-decision reply prefix requesting a web search
pub const SEARCH_DIRECTIVE: &str = "DO_SEARCH:";

/// Moderator token signalling the conversation has converged
pub const CONVO_OVER: &str = "CONVO_OVER";

/// Marker preceding the user-facing summary in a converged Moderator turn
pub const SUMMARY_MARKER: &str = "SUMMARY:";

/// Leading token on a multiagent trigger that requests a search sub-round
pub const SEARCH_FLAG: &str = "--search";

/// Shown when the Moderator converges without a usable summary
pub const FALLBACK_SUMMARY: &str = "Conversation complete. No detailed summary provided.";

/// Outcome of inspecting one Moderator turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeratorVerdict {
    /// No `CONVO_OVER` - run another round if the limit allows
    Continue,
    /// Converged with the trimmed text after the first `SUMMARY:`
    Summary(String),
    /// Converged but no summary could be extracted
    MissingSummary,
}

/// Query following `DO_SEARCH:`, if the decision reply asks for a search.
///
/// The query is everything after the first occurrence, trimmed; it may be
/// empty, in which case the caller decides what to search for.
pub fn parse_search_directive(reply: &str) -> Option<String> {
    reply
        .split_once(SEARCH_DIRECTIVE)
        .map(|(_, query)| query.trim().to_string())
}

pub fn parse_moderator_verdict(reply: &str) -> ModeratorVerdict {
    if !reply.contains(CONVO_OVER) {
        return ModeratorVerdict::Continue;
    }

    match reply.split_once(SUMMARY_MARKER) {
        Some((_, summary)) if !summary.trim().is_empty() => {
            ModeratorVerdict::Summary(summary.trim().to_string())
        }
        _ => ModeratorVerdict::MissingSummary,
    }
}

/// Split a multiagent argument into `(use_search, question)`.
///
/// Only a leading `--search` token counts; the question is the remainder,
/// trimmed. Without the flag the input is returned unchanged.
pub fn parse_search_flag(input: &str) -> (bool, &str) {
    let trimmed = input.trim_start();
    match trimmed.strip_prefix(SEARCH_FLAG) {
        Some(rest) if rest.is_empty() || rest.starts_with(char::is_whitespace) => {
            (true, rest.trim())
        }
        _ => (false, input),
    }
}
