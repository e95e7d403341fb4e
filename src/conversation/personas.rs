// Persona descriptors and the prompt renderer shared by all of them

use std::fmt;

use super::transcript::{Speaker, Transcript};

/// Shared verbosity rule every persona is held to
const VERBOSITY_RULE: &str = "Keep your response to 5 sentences or less, written in a single \
paragraph without bullet points or headings. Don't overcomplicate simple answers - when an \
answer is clear, answer directly without trying to find hidden meanings.";

/// Shared instruction for personas that consume search output
const SEARCH_AWARENESS: &str = "If the conversation history contains an entry tagged \
SearchResults, treat it as accurate, up-to-date factual information and build on it rather \
than contradicting it.";

const MODERATOR_CLOSING: &str = "If the conversation should continue, provide your thoughts. \
If the conversation is complete, end with 'CONVO_OVER. SUMMARY: [your 2-3 sentence summary of \
the key points and conclusion. Note that this summary is to be displayed to the user, so you \
shouldn't mention things about the thought process, just the answer]'";

/// The fixed roles a prompt can be rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Persona {
    Brainstormer,
    Critic,
    Synthesizer,
    Moderator,
    SearchDecision,
    SearchSummary,
}

/// Everything that distinguishes one persona's prompt from another's
#[derive(Debug, Clone, Copy)]
pub struct PersonaDescriptor {
    /// Cue written after the history, e.g. `Critic:`
    pub name: &'static str,
    /// Role description opening the system block
    pub role: &'static str,
    /// What to do when the limit is reached; appended after the limit sentence
    pub final_round: &'static str,
    /// Whether SearchResults entries are to be trusted as facts
    pub search_aware: bool,
    /// Directive appended after the iteration footer
    pub closing: Option<&'static str>,
}

impl Persona {
    /// Round order inside one multiagent iteration
    pub const ROUND: [Persona; 4] = [
        Persona::Brainstormer,
        Persona::Critic,
        Persona::Synthesizer,
        Persona::Moderator,
    ];

    pub fn descriptor(&self) -> PersonaDescriptor {
        match self {
            Persona::Brainstormer => PersonaDescriptor {
                name: "Brainstormer",
                role: "You are the Brainstormer agent. Your task is to generate creative and \
                       analytical ideas to address the user's query. Use the full conversation \
                       history below to build on previous ideas and refine your suggestions. \
                       Only use deeper reasoning when questions are genuinely complex or difficult.",
                final_round: "if this is the final round, provide a summary of your best proposals.",
                search_aware: true,
                closing: None,
            },
            Persona::Critic => PersonaDescriptor {
                name: "Critic",
                role: "You are the Critic agent. Your task is to evaluate the brainstormed ideas, \
                       flag any flaws or inaccuracies, and suggest improvements. Use the full \
                       conversation history below to ensure your feedback is thorough and relevant. \
                       Only use deeper critical analysis when questions are genuinely complex or difficult.",
                final_round: "if this is the final round, emphasize the key points that need to be resolved.",
                search_aware: true,
                closing: None,
            },
            Persona::Synthesizer => PersonaDescriptor {
                name: "Synthesizer",
                role: "You are the Synthesizer agent. Your task is to transform the brainstormed \
                       ideas and critiques into concrete, actionable steps or solutions. Consider \
                       both the creative suggestions from the Brainstormer and the concerns raised \
                       by the Critic. Prioritize specific, implementable solutions over theoretical \
                       discussions, and include technical details concisely when they are relevant.",
                final_round: "if this is the final round, focus on the most viable solution.",
                search_aware: true,
                closing: None,
            },
            Persona::Moderator => PersonaDescriptor {
                name: "Moderator",
                role: "You are the Moderator agent. Your role is to manage the dialogue between the \
                       Brainstormer, Critic and Synthesizer agents. Review the full conversation \
                       history below, keep the conversation on track and make sure it converges to \
                       a coherent answer. You don't need to use all iterations - if a clear answer \
                       has been reached, end the conversation early. It is critical that you do not \
                       overcomplicate or over-iterate.",
                final_round: "if this is the final round, you must end the conversation.",
                search_aware: true,
                closing: Some(MODERATOR_CLOSING),
            },
            Persona::SearchDecision => PersonaDescriptor {
                name: "Search",
                role: "You are the Search agent. Decide whether answering the user's latest \
                       question requires current or external information that you cannot answer \
                       reliably from your own knowledge. If and only if it does, reply with a line \
                       beginning with 'DO_SEARCH: ' followed by a concise web search query. \
                       Otherwise, answer the question directly.",
                final_round: "this first step only decides whether a search is needed.",
                search_aware: false,
                closing: None,
            },
            Persona::SearchSummary => PersonaDescriptor {
                name: "Search",
                role: "You are the Search agent. A web search was performed for the user's latest \
                       question. Use the search results below to answer it, relying first on the \
                       most relevant information and the key facts. Do not invent facts that the \
                       results do not support.",
                final_round: "this final step answers the question from the results.",
                search_aware: true,
                closing: None,
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Transcript tag for this persona's replies
    pub fn speaker(&self) -> Speaker {
        match self {
            Persona::Brainstormer => Speaker::Brainstormer,
            Persona::Critic => Speaker::Critic,
            Persona::Synthesizer => Speaker::Synthesizer,
            Persona::Moderator => Speaker::Moderator,
            Persona::SearchDecision | Persona::SearchSummary => Speaker::SearchAgent,
        }
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Render a persona's prompt from the transcript and iteration metadata.
///
/// Layout, in order: system block (role, verbosity rule, search awareness,
/// iteration limit), conversation history, `"<Name>:"` cue, iteration
/// footer, and the persona's closing directive if it has one.
pub fn build_prompt(
    persona: Persona,
    transcript: &Transcript,
    iteration: usize,
    iteration_limit: usize,
) -> String {
    render(persona, transcript, iteration, iteration_limit, None)
}

/// Like [`build_prompt`], with an extra `[Search Results]` block placed
/// between the system block and the conversation history.
pub fn build_prompt_with_context(
    persona: Persona,
    transcript: &Transcript,
    iteration: usize,
    iteration_limit: usize,
    context: &str,
) -> String {
    render(persona, transcript, iteration, iteration_limit, Some(context))
}

fn render(
    persona: Persona,
    transcript: &Transcript,
    iteration: usize,
    iteration_limit: usize,
    context: Option<&str>,
) -> String {
    let d = persona.descriptor();

    let mut prompt = String::from("[System]\n");
    prompt.push_str(d.role);
    prompt.push(' ');
    prompt.push_str(VERBOSITY_RULE);
    prompt.push(' ');
    if d.search_aware {
        prompt.push_str(SEARCH_AWARENESS);
        prompt.push(' ');
    }
    prompt.push_str(&format!(
        "The iteration limit is {} rounds; {}\n",
        iteration_limit, d.final_round
    ));

    if let Some(context) = context {
        prompt.push_str("[Search Results]\n");
        prompt.push_str(context);
        prompt.push('\n');
    }

    prompt.push_str("[Conversation History]\n");
    prompt.push_str(&transcript.render());
    prompt.push('\n');
    prompt.push_str(&format!("{}:\n", d.name));
    prompt.push_str(&format!(
        "[Iteration Info]\nCurrent iteration: {} of {}.\n",
        iteration, iteration_limit
    ));

    if let Some(closing) = d.closing {
        prompt.push_str(closing);
    }

    prompt
}
