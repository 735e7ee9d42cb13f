//! `trajmod render` — Show what would be sent, without sending it.

use std::path::PathBuf;

use clap::Args;
use trajmod_core::{PromptTemplate, build_prompt, format_conversation_history, load_trajectory};

use super::read_text;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Trajectory JSON file (`-` reads stdin)
    #[arg(long)]
    pub trajectory: PathBuf,

    /// Render the full prompt from this template instead of the bare transcript
    #[arg(long)]
    pub prompt: Option<PathBuf>,

    /// Optional taxonomy file, substituted for {taxonomy}
    #[arg(long, requires = "prompt")]
    pub taxonomy: Option<PathBuf>,
}

pub fn run(args: RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
    let trajectory = load_trajectory(&args.trajectory)?;

    let output = match &args.prompt {
        Some(prompt) => {
            let template = PromptTemplate::load(prompt)?;
            let taxonomy = args.taxonomy.as_deref().map(read_text).transpose()?;
            build_prompt(&trajectory, &template, taxonomy.as_deref())?
        }
        None => format_conversation_history(&trajectory),
    };

    println!("{output}");
    Ok(())
}
