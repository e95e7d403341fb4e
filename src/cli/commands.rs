// `!command` parsing and dispatch

use anyhow::Result;

use crate::conversation::{ConversationController, EventSender};

pub const COMMAND_PREFIX: char = '!';

const MISSING_BRAINSTORM: &str = "Please provide a question for the Brainstormer.";
const MISSING_CRITIQUE: &str = "Please provide an idea for the Critic to evaluate.";
const MISSING_SEARCH: &str = "Please provide a question for the Search agent.";
const MISSING_MULTIAGENT: &str = "Please provide an input for the multiagent conversation.";

const MEMORY_CLEARED: &str = "Your conversation memory has been cleared.";
const NO_MEMORY: &str = "You have no conversation memory to clear.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Brainstorm(String),
    Critique(String),
    SearchAgent(String),
    /// Raw input, possibly starting with `--search`
    MultiAgent(String),
    Clear,
    Help,
    Ping(Option<String>),
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse one input line; `None` for lines that are not commands
    pub fn parse(input: &str) -> Option<Self> {
        let body = input.trim().strip_prefix(COMMAND_PREFIX)?;
        let (name, arg) = match body.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (body, ""),
        };

        let command = match name {
            "brainstorm" => Command::Brainstorm(arg.to_string()),
            "critique" => Command::Critique(arg.to_string()),
            "searchagent" => Command::SearchAgent(arg.to_string()),
            "multiagent" => Command::MultiAgent(arg.to_string()),
            "clear" => Command::Clear,
            "help" => Command::Help,
            "ping" => Command::Ping((!arg.is_empty()).then(|| arg.to_string())),
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}

/// Run a command for `user_id`.
///
/// Conversation output is streamed through `events`; the returned string,
/// if any, is a direct reply to print after the stream ends.
pub async fn handle_command(
    command: Command,
    controller: &ConversationController,
    user_id: &str,
    events: &EventSender,
) -> Result<Option<String>> {
    match command {
        Command::Brainstorm(question) => {
            if question.is_empty() {
                return Ok(Some(MISSING_BRAINSTORM.to_string()));
            }
            controller.brainstorm(user_id, &question, events).await?;
            Ok(None)
        }
        Command::Critique(idea) => {
            if idea.is_empty() {
                return Ok(Some(MISSING_CRITIQUE.to_string()));
            }
            controller.critique(user_id, &idea, events).await?;
            Ok(None)
        }
        Command::SearchAgent(question) => {
            if question.is_empty() {
                return Ok(Some(MISSING_SEARCH.to_string()));
            }
            controller.search_agent(user_id, &question, events).await?;
            Ok(None)
        }
        Command::MultiAgent(input) => {
            if is_blank_multiagent(&input) {
                return Ok(Some(MISSING_MULTIAGENT.to_string()));
            }
            controller.multiagent(user_id, &input, events).await?;
            Ok(None)
        }
        Command::Clear => Ok(Some(clear_reply(controller.clear_memory(user_id)))),
        Command::Help => Ok(Some(format_help())),
        Command::Ping(arg) => Ok(Some(format_ping(arg.as_deref()))),
        Command::Quit => Ok(Some("Goodbye!".to_string())),
        Command::Unknown(name) => Ok(Some(format!(
            "Unknown command: {}{}. Type !help for available commands.",
            COMMAND_PREFIX, name
        ))),
    }
}

/// `!multiagent --search` with nothing after the flag has no question either
fn is_blank_multiagent(input: &str) -> bool {
    let (_, question) = crate::conversation::parse_search_flag(input);
    question.trim().is_empty()
}

fn clear_reply(cleared: bool) -> String {
    if cleared { MEMORY_CLEARED } else { NO_MEMORY }.to_string()
}

fn format_ping(arg: Option<&str>) -> String {
    match arg {
        Some(arg) => format!("Pong! Your argument was {}", arg),
        None => "Pong!".to_string(),
    }
}

fn format_help() -> String {
    r#"Available commands:
  !brainstorm <question>        - Brainstormer proposes ideas
                                  e.g. !brainstorm How can I learn Rust faster?
  !critique <idea>              - Critic evaluates an idea
                                  e.g. !critique Rewrite the backend in Rust
  !searchagent <question>       - Search agent answers, searching the web if needed
                                  e.g. !searchagent Who won the last World Cup?
  !multiagent [--search] <q>    - Brainstormer, Critic, Synthesizer and Moderator
                                  discuss until the Moderator concludes
                                  e.g. !multiagent --search Best laptop for students?
  !clear                        - Forget your conversation memory
  !ping [arg]                   - Check that the bot is alive
  !help                         - Show this help message
  !quit                         - Exit

Roles:
  Brainstormer  generates creative and analytical ideas
  Critic        flags flaws and suggests improvements
  Synthesizer   turns ideas and critiques into concrete steps
  Moderator     keeps the discussion on track and ends it with a summary
  Search agent  decides when a web search is needed and summarizes results"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("!brainstorm  how to learn rust "),
            Some(Command::Brainstorm("how to learn rust".to_string()))
        );
        assert_eq!(
            Command::parse("!multiagent --search best laptop"),
            Some(Command::MultiAgent("--search best laptop".to_string()))
        );
        assert_eq!(Command::parse("!clear"), Some(Command::Clear));
        assert_eq!(Command::parse("!exit"), Some(Command::Quit));
        assert_eq!(
            Command::parse("!dance now"),
            Some(Command::Unknown("dance".to_string()))
        );
    }

    #[test]
    fn test_non_prefixed_lines_ignored() {
        assert_eq!(Command::parse("brainstorm ideas"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn test_empty_argument_parses_empty() {
        assert_eq!(
            Command::parse("!critique"),
            Some(Command::Critique(String::new()))
        );
        assert_eq!(Command::parse("!ping"), Some(Command::Ping(None)));
        assert_eq!(
            Command::parse("!ping hello there"),
            Some(Command::Ping(Some("hello there".to_string())))
        );
    }

    #[test]
    fn test_ping_replies() {
        assert_eq!(format_ping(None), "Pong!");
        assert_eq!(format_ping(Some("hi")), "Pong! Your argument was hi");
    }

    #[test]
    fn test_clear_replies() {
        assert_eq!(clear_reply(true), MEMORY_CLEARED);
        assert_eq!(clear_reply(false), NO_MEMORY);
    }

    #[test]
    fn test_blank_multiagent() {
        assert!(is_blank_multiagent(""));
        assert!(is_blank_multiagent("--search"));
        assert!(is_blank_multiagent("--search   "));
        assert!(!is_blank_multiagent("--search rust"));
    }

    #[test]
    fn test_help_lists_every_command() {
        let help = format_help();
        for cmd in [
            "!brainstorm",
            "!critique",
            "!searchagent",
            "!multiagent",
            "!clear",
            "!ping",
        ] {
            assert!(help.contains(cmd), "help is missing {}", cmd);
        }
    }
}
