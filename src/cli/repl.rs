// Interactive REPL over the `!command` trigger surface

use anyhow::Result;
use crossterm::{style::Stylize, terminal};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::{self, IsTerminal};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::conversation::{ConversationController, ConversationEvent};

use super::commands::{handle_command, Command};

/// Get current terminal width, or default to 80 if not a TTY
fn terminal_width() -> usize {
    terminal::size().map(|(w, _)| w as usize).unwrap_or(80)
}

pub struct Repl {
    controller: Arc<ConversationController>,
    user_id: String,
    is_interactive: bool,
}

impl Repl {
    pub fn new(controller: Arc<ConversationController>, user_id: impl Into<String>) -> Self {
        Self {
            controller,
            user_id: user_id.into(),
            is_interactive: io::stdout().is_terminal(),
        }
    }

    pub async fn run(&self) -> Result<()> {
        let mut editor = DefaultEditor::new()?;

        if self.is_interactive {
            println!("Council v{}", env!("CARGO_PKG_VERSION"));
            println!("Ready. Type !help for commands.");
        }

        loop {
            if self.is_interactive {
                self.print_separator();
            }

            let line = match editor.readline("> ") {
                Ok(line) => line,
                Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
                Err(e) => return Err(e.into()),
            };

            let input = line.trim();
            if input.is_empty() {
                continue;
            }
            let _ = editor.add_history_entry(input);

            if Command::parse(input) == Some(Command::Quit) {
                if self.is_interactive {
                    println!("Goodbye!");
                }
                break;
            }

            if let Err(e) = self.execute(input).await {
                eprintln!("{} {:#}", "Error:".red(), e);
            }
        }

        Ok(())
    }

    /// Parse and run one line, printing conversation output as it arrives.
    ///
    /// Lines without the `!` prefix are ignored.
    pub async fn execute(&self, input: &str) -> Result<()> {
        let Some(command) = Command::parse(input) else {
            tracing::debug!("Ignoring non-command input");
            return Ok(());
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(print_events(rx));

        let result = handle_command(command, &self.controller, &self.user_id, &tx).await;

        // Close the channel so the printer drains and exits
        drop(tx);
        let _ = printer.await;

        if let Some(reply) = result? {
            println!("{}", reply);
        }
        Ok(())
    }

    /// Print separator line that adapts to terminal width
    fn print_separator(&self) {
        println!("{}", "─".repeat(terminal_width()).dark_grey());
    }
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<ConversationEvent>) {
    while let Some(event) = rx.recv().await {
        println!("{}", event);
    }
}
