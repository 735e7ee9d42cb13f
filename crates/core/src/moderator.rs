//! Moderator — one trajectory in, one judgment out.
//!
//! Formats the trajectory, fills the prompt template, and sends the result as
//! the single user message of one chat request. No retries.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest, Usage};
use crate::template::{PromptTemplate, TAXONOMY_VAR, TRAJECTORY_VAR};
use crate::transcript::format_conversation_history;

/// The model's answer for one trajectory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Judgment {
    /// Raw text of the first choice
    pub content: String,

    /// Which model actually responded
    pub model: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    pub created_at: DateTime<Utc>,
}

/// Build the full moderation prompt for a trajectory.
///
/// `taxonomy` of `None` fills `{taxonomy}` with the empty string.
pub fn build_prompt(
    trajectory: &Value,
    template: &PromptTemplate,
    taxonomy: Option<&str>,
) -> Result<String> {
    let transcript = format_conversation_history(trajectory);
    let prompt = template.render(&[
        (TRAJECTORY_VAR, transcript.as_str()),
        (TAXONOMY_VAR, taxonomy.unwrap_or_default()),
    ])?;
    Ok(prompt)
}

/// Sends moderation prompts to a provider.
pub struct Moderator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl Moderator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    /// Cap the judgment length.
    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Judge one trajectory.
    pub async fn judge(
        &self,
        trajectory: &Value,
        template: &PromptTemplate,
        taxonomy: Option<&str>,
    ) -> Result<Judgment> {
        let prompt = build_prompt(trajectory, template, taxonomy)?;
        debug!(chars = prompt.len(), "Rendered moderation prompt");
        self.judge_prompt(prompt).await
    }

    /// Send an already-rendered prompt.
    pub async fn judge_prompt(&self, prompt: String) -> Result<Judgment> {
        let request = ProviderRequest {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            ..ProviderRequest::new(&self.model, vec![Message::user(prompt)])
        };

        debug!(provider = %self.provider.name(), model = %self.model, "Requesting judgment");
        let response = self.provider.complete(request).await?;

        Ok(Judgment {
            content: response.message.content,
            model: response.model,
            usage: response.usage,
            created_at: Utc::now(),
        })
    }
}
