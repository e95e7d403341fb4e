// Council - multi-persona conversation orchestrator
// Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use council::cli::{Repl, COMMAND_PREFIX};
use council::config::{load_config, load_dotenv};
use council::conversation::{ConversationController, MemoryStore};
use council::logging;
use council::providers::MistralProvider;
use council::search::BraveSearchProvider;

#[derive(Parser, Debug)]
#[command(name = "council", version, about = "Brainstorm, critique, synthesize and moderate over one LLM")]
struct Args {
    /// Config file (default: ~/.council/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// User id that owns the conversation memory
    #[arg(long, global = true, default_value = "local")]
    user: String,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Override the multiagent iteration limit
    #[arg(long, global = true)]
    iterations: Option<usize>,

    /// Do not seed or record conversation memory
    #[arg(long, global = true)]
    no_memory: bool,

    #[command(subcommand)]
    command: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Interactive session reading `!commands`
    Repl,
    /// Run one command and exit, e.g. `council run multiagent --search best laptop`
    Run {
        /// Command name without the `!` prefix
        command: String,
        /// Command argument
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(args.verbose);

    load_dotenv(None)?;

    let mut config = load_config(args.config.as_deref())?;
    if let Some(limit) = args.iterations {
        config.conversation.iteration_limit = limit;
    }
    if args.no_memory {
        config.conversation.use_memory = false;
    }
    config.validate().context("Invalid configuration")?;

    let provider = MistralProvider::from_config(&config.provider, &config.retry)?;
    let memory = Arc::new(MemoryStore::with_max_length(
        config.conversation.max_memory_length,
    ));

    let mut controller =
        ConversationController::new(Arc::new(provider), memory, config.conversation.clone())
            .with_search_count(config.search.result_count);

    match BraveSearchProvider::from_config(&config.search)? {
        Some(search) => controller = controller.with_search(Arc::new(search)),
        None => tracing::info!("No search key configured; web search disabled"),
    }

    let repl = Repl::new(Arc::new(controller), args.user);

    match args.command {
        Mode::Repl => repl.run().await,
        Mode::Run { command, text } => {
            let line = format!("{}{} {}", COMMAND_PREFIX, command, text.join(" "));
            repl.execute(&line).await
        }
    }
}
