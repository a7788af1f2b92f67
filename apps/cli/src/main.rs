//! ACE CLI - maintain the playbook that the agent loop learns into.
//!
//! Provides an `ace` command for inspecting and curating the playbook file
//! by hand, without running an episode.

mod commands;

use std::path::PathBuf;

use ace_core::{AceConfig, EntryTag, PlaybookStore};
use anyhow::Context;
use clap::{Parser, Subcommand};
use commands::playbook;
use tracing_subscriber::EnvFilter;

/// ACE - playbook maintenance for the agent loop
#[derive(Parser, Debug)]
#[command(name = "ace", author, version, about = "Inspect and curate an ACE playbook")]
struct Args {
    /// Playbook file (overrides the configured path)
    #[arg(short, long, global = true)]
    playbook: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "ace.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the playbook as the agents see it
    Show {
        /// Output the raw JSON document
        #[arg(long)]
        json: bool,
    },

    /// Add an entry
    Add {
        /// Section title (defaults to the configured default section)
        #[arg(short, long)]
        section: Option<String>,

        /// Entry text
        #[arg(short = 'C', long)]
        content: String,
    },

    /// Remove every entry with an id
    Remove {
        /// Entry id
        #[arg(long)]
        id: String,
    },

    /// Rewrite the content of every entry with an id
    Modify {
        /// Entry id
        #[arg(long)]
        id: String,

        /// Replacement text
        #[arg(short = 'C', long)]
        content: String,
    },

    /// Record a helpful, harmful or neutral judgement for an entry
    Tag {
        /// Entry id
        #[arg(long)]
        id: String,

        /// helpful, harmful or neutral
        #[arg(long)]
        tag: EntryTag,
    },

    /// Per-section counts and counter totals
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AceConfig::load_or_default(&args.config)
        .with_context(|| format!("Failed to load configuration from {}", args.config.display()))?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level);

    let path = args.playbook.unwrap_or_else(|| config.playbook.path.clone());
    let mut store = PlaybookStore::open(path).with_default_section(config.playbook.default_section.clone());

    match args.command {
        Command::Show { json } => playbook::show(&store, json),
        Command::Add { section, content } => playbook::add(&mut store, section.as_deref(), &content),
        Command::Remove { id } => playbook::remove(&mut store, &id),
        Command::Modify { id, content } => playbook::modify(&mut store, &id, &content),
        Command::Tag { id, tag } => playbook::tag(&mut store, &id, tag),
        Command::Stats { json } => playbook::stats(&store, json),
    }
}
