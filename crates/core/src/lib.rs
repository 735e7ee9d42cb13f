//! # trajmod Core
//!
//! Domain types, traits, and error definitions for trajmod, a one-shot
//! trajectory moderation tool. This crate does no networking and knows
//! nothing about configuration files.
//!
//! ## Layout
//!
//! - [`trajectory`] classifies a parsed trajectory and its turns
//! - [`transcript`] renders it as linear text (infallible)
//! - [`template`] fills a prompt template with the transcript
//! - [`moderator`] sends the prompt through a [`Provider`]

pub mod error;
pub mod message;
pub mod provider;
pub mod trajectory;
pub mod transcript;
pub mod template;
pub mod moderator;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, TemplateError};
pub use message::{Message, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
pub use trajectory::{Trajectory, Turn, TurnRole, load_trajectory};
pub use transcript::format_conversation_history;
pub use template::PromptTemplate;
pub use moderator::{Judgment, Moderator, build_prompt};
