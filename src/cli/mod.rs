//! CLI entry point for Mailgate.

pub mod chat;
pub mod decide;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::decision::DecisionKind;

/// Mailgate CLI
#[derive(Parser, Debug)]
#[command(name = "mailgate", version, about = "Approve, reject or edit an agent's emails")]
pub struct Cli {
    /// Config file (default: $MAILGATE_CONFIG, then ~/.mailgate/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chat with the email agent
    Chat(ChatArgs),
    /// Print the resume payload for a decision on a pending call
    Decide(DecideArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Directory for conversation checkpoints
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,

    /// Ask again after every edit instead of sending straight away
    #[arg(long)]
    pub confirm_edits: bool,

    /// Resume an existing thread instead of starting a new one
    #[arg(long)]
    pub thread: Option<String>,
}

/// Arguments for the `decide` subcommand.
#[derive(Parser, Debug)]
pub struct DecideArgs {
    /// approve, reject or edit
    pub kind: DecisionKind,

    /// Pending tool call as JSON: {"name": "...", "args": {...}}
    #[arg(long)]
    pub pending: String,

    /// Rejection reason
    #[arg(long)]
    pub reason: Option<String>,

    /// Replacement arguments for an edit, as a JSON object
    #[arg(long)]
    pub args: Option<String>,
}
