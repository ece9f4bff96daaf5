//! Config command - configuration management.

use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use clap::{Args, Subcommand};
use studydesk_config::{LayerStatus, StudydeskConfig};

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the merged configuration and the files it came from
    Show,

    /// Show the user configuration file path
    Path,

    /// Write a config file with default values
    Init {
        /// Create project-local config (./studydesk.toml) instead of user config
        #[arg(long)]
        local: bool,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => cmd_show(ctx),
        ConfigCommand::Path => cmd_path(),
        ConfigCommand::Init { local, force } => cmd_init(local, force),
    }
}

fn cmd_show(ctx: &Context) -> Result<()> {
    let loaded = &ctx.loaded;
    let shown = loaded.config.redacted();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&shown)?);
        return Ok(());
    }

    println!("# studydesk configuration\n");

    if loaded.loaded_paths().is_empty() {
        println!("No config files loaded (using defaults)\n");
    }
    println!("Config files:");
    for report in &loaded.layers {
        let status = match &report.status {
            LayerStatus::Missing => "not found",
            LayerStatus::Loaded => "loaded",
            LayerStatus::Rejected(_) => "skipped",
        };
        println!("  {:<8} {} ({})", report.layer, report.path.display(), status);
    }
    println!();

    let session = loaded.config.session();
    println!("Session cache:");
    println!("  ttl: {}s", session.ttl_secs);
    println!("  history: {} pairs", session.max_history_pairs);
    println!("  max sessions: {}", session.max_sessions);
    println!();

    let llm = loaded.config.llm();
    println!("Model:");
    println!("  {} @ {}", llm.model, llm.base_url);
    println!(
        "  api key: {}",
        if llm.resolve_api_key().is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!();

    let warnings = loaded.warnings();
    if !warnings.is_empty() {
        println!("Warnings:");
        for w in &warnings {
            println!("  ⚠ {}", w);
        }
        println!();
    }

    if ctx.verbose {
        println!("---\nRaw config:\n");
        println!("{}", shown.to_toml()?);
    }

    Ok(())
}

fn cmd_path() -> Result<()> {
    match studydesk_config::user_config_file() {
        Some(path) => println!("{}", path.display()),
        None => bail!("could not determine the user config directory"),
    }
    Ok(())
}

fn cmd_init(local: bool, force: bool) -> Result<()> {
    let path = if local {
        PathBuf::from(studydesk_config::discovery::PROJECT_FILE)
    } else {
        studydesk_config::user_config_file()
            .context("could not determine the user config directory")?
    };

    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    studydesk_config::write_file(&StudydeskConfig::with_defaults(), &path)?;
    println!("Wrote {}", path.display());
    Ok(())
}
