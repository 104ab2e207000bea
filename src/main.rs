//! Mailgate CLI binary entry point.

use std::sync::Arc;

use clap::Parser;
use mailgate::cli::{chat, decide, ChatArgs, Cli, Commands, DecideArgs};
use mailgate::config::GateConfig;
use mailgate::error::Result;
use mailgate::runtime::{DirectivePlanner, FileCheckpointer};
use mailgate::session::ChatSession;
use mailgate::tools::builtin::all_tools;
use mailgate::tools::Outbox;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match GateConfig::resolve(cli.config.as_deref()) {
        Ok(config) => match cli.command {
            Commands::Chat(args) => handle_chat(config, args).await,
            Commands::Decide(args) => handle_decide(&config, &args),
        },
        Err(err) => Err(err),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("MAILGATE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn handle_chat(config: GateConfig, args: ChatArgs) -> Result<()> {
    let mut config = config;
    if let Some(dir) = args.checkpoint_dir {
        config = config.with_checkpoint_dir(dir);
    }
    if args.confirm_edits {
        config = config.with_confirm_edits(true);
    }

    let store = FileCheckpointer::new(config.checkpoint_dir());
    let state = chat::resume_thread(&store, args.thread.as_deref())?;

    let tools = all_tools(&Outbox::new());
    let runtime = config.runtime(tools.clone(), Arc::new(DirectivePlanner::new()));
    let mut session = ChatSession::with_state(runtime, config.protocol(tools), state);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    chat::run(&mut session, stdin, &mut stdout).await
}

fn handle_decide(config: &GateConfig, args: &DecideArgs) -> Result<()> {
    let protocol = config.protocol(all_tools(&Outbox::new()));
    println!("{}", decide::render_payload(&protocol, args)?);
    Ok(())
}
