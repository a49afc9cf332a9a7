//! Completion API integration
//!
//! Features:
//! - Claude Messages API client behind `CompletionProvider`
//! - System prompt composition from the biography and visitor classification

pub mod claude;
pub mod prompt;

pub use claude::{ClaudeClient, ClaudeConfig};
pub use prompt::{compose, PromptComposer, ToneAdjustment};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error: HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<LlmError> for career_assistant_core::Error {
    fn from(err: LlmError) -> Self {
        use career_assistant_core::Error;

        match err {
            LlmError::Api { status, message } => Error::Upstream {
                status,
                detail: message,
            },
            LlmError::Network(msg) => Error::Network(msg),
            LlmError::InvalidResponse(msg) => Error::InvalidResponse(msg),
            LlmError::Timeout(ms) => Error::Timeout(ms),
            LlmError::Configuration(msg) => Error::Configuration(msg),
        }
    }
}
