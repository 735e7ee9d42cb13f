//! trajmod CLI — the main entry point.
//!
//! Commands:
//! - `judge`   — Format a trajectory, fill the prompt, ask the model
//! - `render`  — Print the transcript or full prompt without calling a model

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "trajmod",
    about = "trajmod — moderation judgments for recorded agent trajectories",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.trajmod/config.toml)
    #[arg(long, global = true, env = "TRAJMOD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask a chat model to judge a trajectory
    Judge(commands::judge::JudgeArgs),

    /// Render a trajectory offline
    Render(commands::render::RenderArgs),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries only the result.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Judge(args) => commands::judge::run(args, cli.config.as_deref()).await?,
        Commands::Render(args) => commands::render::run(args)?,
    }

    Ok(())
}
