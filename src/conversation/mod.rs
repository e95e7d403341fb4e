// Multi-persona conversation engine
//
// Brainstormer, Critic, Synthesizer and Moderator take turns over a shared
// transcript until the Moderator converges or the iteration limit is hit.
// A Search persona can run a web search sub-round first and feed its ranked
// summary into the transcript.

pub mod controller;
pub mod memory;
pub mod personas;
pub mod search;
pub mod sentinel;
pub mod transcript;
pub mod types;

pub use controller::{ConversationController, EventSender};
pub use memory::MemoryStore;
pub use personas::{build_prompt, build_prompt_with_context, Persona, PersonaDescriptor};
pub use search::{build_search_decision_prompt, process_results, RankedSearchContext, SearchRecord};
pub use sentinel::{
    parse_moderator_verdict, parse_search_directive, parse_search_flag, ModeratorVerdict,
    FALLBACK_SUMMARY,
};
pub use transcript::{Speaker, Transcript, TranscriptEntry};
pub use types::{ConversationEvent, ConversationOutcome, IterationState, OutcomeStatus};
