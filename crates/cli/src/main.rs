//! Samovar CLI — the main entry point.
//!
//! Commands:
//! - `run`    — Connect to Slack and serve messages
//! - `doctor` — Check configuration and report what's enabled

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "samovar",
    about = "Samovar — a Slack chat-bot bridge to LLM completion endpoints",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to Slack and serve messages
    Run,

    /// Check configuration and report what's enabled
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env first, so it can feed the config env overrides.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run => commands::run::run().await,
        Commands::Doctor => commands::doctor::run().await,
    }
}
