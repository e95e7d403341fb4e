// CLI module
// `!command` trigger surface and the interactive REPL

mod commands;
mod repl;

pub use commands::{handle_command, Command, COMMAND_PREFIX};
pub use repl::Repl;
