//! `trajmod judge` — Submit one trajectory for a moderation judgment.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use tracing::debug;
use trajmod_config::AppConfig;
use trajmod_core::{Error, Moderator, PromptTemplate, load_trajectory};
use trajmod_providers::OpenAiCompatProvider;

use super::read_text;

#[derive(Debug, Args)]
pub struct JudgeArgs {
    /// Trajectory JSON file (`-` reads stdin)
    #[arg(long)]
    pub trajectory: PathBuf,

    /// Model name sent to the endpoint
    #[arg(long)]
    pub model: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key sent as a bearer token
    #[arg(long)]
    pub api_key: Option<String>,

    /// Prompt template path
    #[arg(long)]
    pub prompt: Option<PathBuf>,

    /// Optional taxonomy file, substituted for {taxonomy}
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Maximum tokens in the judgment
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Print the judgment as a JSON record
    #[arg(long)]
    pub json: bool,
}

impl JudgeArgs {
    /// Flags win over file and environment values.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(api_key) = &self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(prompt) = &self.prompt {
            config.prompt = prompt.clone();
        }
        if self.temperature.is_some() {
            config.temperature = self.temperature;
        }
        if self.max_tokens.is_some() {
            config.max_tokens = self.max_tokens;
        }
    }
}

/// File and environment, then flags, then one validation pass.
fn resolve_config(args: &JudgeArgs, config_path: Option<&Path>) -> Result<AppConfig, Error> {
    let to_error = |e: trajmod_config::ConfigError| Error::Config { message: e.to_string() };
    let mut config = AppConfig::load(config_path).map_err(to_error)?;
    args.apply_to(&mut config);
    config.validate().map_err(to_error)?;
    Ok(config)
}

pub async fn run(args: JudgeArgs, config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&args, config_path)?;
    debug!(?config, "Resolved configuration");

    let model = config
        .model
        .clone()
        .ok_or("No model configured. Pass --model, set TRAJMOD_MODEL, or add `model` to the config file.")?;

    let trajectory = load_trajectory(&args.trajectory)?;
    let template = PromptTemplate::load(&config.prompt)?;
    let taxonomy = args.taxonomy.as_deref().map(read_text).transpose()?;

    let provider = Arc::new(OpenAiCompatProvider::from_config(&config)?);
    let moderator = Moderator::new(provider, model)
        .with_temperature(config.temperature)
        .with_max_tokens(config.max_tokens);

    let judgment = moderator
        .judge(&trajectory, &template, taxonomy.as_deref())
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&judgment)?);
    } else {
        println!("{}", judgment.content);
    }

    Ok(())
}
