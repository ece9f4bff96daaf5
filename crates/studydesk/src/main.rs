//! studydesk - chat with your study documents.
//!
//! Main entry point for the studydesk CLI.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod logging;

use commands::{chat, config};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// studydesk - chat with your study documents
#[derive(Parser)]
#[command(name = "studydesk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chat with a text document (REPL)
    Chat(chat::ChatArgs),

    /// Configuration management
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = studydesk_config::discover(None, None);
    let _guard = logging::init(&loaded.config.logging(), cli.verbose);

    for warning in loaded.warnings() {
        tracing::warn!("{}", warning);
    }

    let ctx = commands::Context {
        loaded,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
