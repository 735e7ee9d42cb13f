//! Error types for the trajmod domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. The transcript formatter
//! itself has none: every input shape renders to some text.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all trajmod operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Prompt template errors ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- File access ---
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Trajectory at {path} is not valid JSON: {source}")]
    InvalidTrajectory {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures while substituting values into a prompt template.
///
/// Offsets are byte positions into the template source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown placeholder '{{{0}}}'")]
    UnknownPlaceholder(String),

    #[error("empty placeholder '{{}}' at byte {0}")]
    EmptyPlaceholder(usize),

    #[error("placeholder '{{{0}}}' uses a conversion or format spec, which is not supported")]
    UnsupportedSpec(String),

    #[error("unclosed '{{' at byte {0}")]
    UnclosedBrace(usize),

    #[error("single '}}' at byte {0} must be escaped as '}}}}'")]
    StrayClosingBrace(usize),
}
