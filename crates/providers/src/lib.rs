//! Chat-completion provider implementations for trajmod.
//!
//! All providers implement the `trajmod_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
